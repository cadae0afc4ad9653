//! Display-value heuristic
//!
//! Guesses a money-like value for a record from loosely named fields. Purely
//! cosmetic: nothing in the aggregation path depends on it.

use crate::types::{JsonObject, JsonValue, Record};

/// Field names tried, in order
const VALUE_KEYS: &[&str] = &[
    "amount", "price", "value", "revenue", "earnings", "points", "total",
];

/// Nested objects searched below the record itself
const MAX_DEPTH: usize = 3;

/// Best-effort display value for a record, with two decimals.
///
/// Looks for a numeric field named like a money amount, first on the record
/// and then breadth-first through nested objects. A `{ amount, currency }`
/// object renders with its currency code.
pub fn derive_display_value(record: &Record) -> Option<String> {
    let JsonValue::Object(map) = record else {
        return None;
    };

    let mut level = vec![map];
    for _ in 0..=MAX_DEPTH {
        for object in &level {
            if let Some(found) = VALUE_KEYS
                .iter()
                .find_map(|key| object.get(*key).and_then(render_value))
            {
                return Some(found);
            }
        }
        level = level
            .into_iter()
            .flat_map(|object| object.values())
            .filter_map(|value| match value {
                JsonValue::Object(inner) => Some(inner),
                _ => None,
            })
            .collect();
        if level.is_empty() {
            break;
        }
    }
    None
}

fn render_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Object(inner) => render_money(inner),
        other => as_number(other).map(|n| format!("{n:.2}")),
    }
}

fn render_money(object: &JsonObject) -> Option<String> {
    let amount = as_number(object.get("amount")?)?;
    match object.get("currency").and_then(JsonValue::as_str) {
        Some(currency) if !currency.trim().is_empty() => {
            Some(format!("{amount:.2} {}", currency.trim()))
        }
        _ => Some(format!("{amount:.2}")),
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
