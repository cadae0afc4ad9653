//! CSV writer
//!
//! Comma separated, CRLF between rows, fields quoted only when they contain a
//! comma, a quote or a line break.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use chrono::{DateTime, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::collections::HashSet;
use std::fmt::Display;

/// Computes an extra column value for one record
pub type Deriver = fn(&Record) -> Option<String>;

/// Build CSV text for `items`.
///
/// The header is the union of the records' keys in first-seen order, followed
/// by the derived column when one is given. Missing fields and nulls are
/// empty; nested objects and arrays are written as compact JSON.
pub fn build_csv(items: &[Record], derived: Option<(&str, Deriver)>) -> Result<String> {
    if items.is_empty() {
        return Ok(String::new());
    }

    let columns = collect_columns(items);

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    if let Some((name, _)) = derived {
        header.push(name);
    }
    writer.write_record(&header)?;

    for item in items {
        let mut row: Vec<String> = columns
            .iter()
            .map(|key| item.get(key).map(render_cell).unwrap_or_default())
            .collect();
        if let Some((_, derive)) = derived {
            row.push(derive(item).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::export(format!("Failed to finish CSV: {e}")))?;
    let mut text =
        String::from_utf8(bytes).map_err(|e| Error::export(format!("CSV is not UTF-8: {e}")))?;

    // rows are separated, not terminated
    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    }
    Ok(text)
}

fn collect_columns(items: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for item in items {
        if let JsonValue::Object(map) = item {
            for key in map.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn render_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// `<prefix>-YYYY-MM-DD_HH-MM.csv` for the given moment
pub fn export_filename<Tz>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{prefix}-{}.csv", at.format("%Y-%m-%d_%H-%M"))
}
