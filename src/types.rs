//! Common types used throughout pagefill
//!
//! Shared aliases, the closed key lists that define the recognized
//! pagination and response conventions, and small utility types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record of a list response
pub type Record = JsonValue;

// ============================================================================
// Recognized Keys
// ============================================================================

/// Request keys carrying a page size
pub const SIZE_KEYS: &[&str] = &[
    "limit",
    "pageSize",
    "page_size",
    "perPage",
    "per_page",
    "take",
    "first",
    "rows",
    "size",
    "count",
];

/// Request keys carrying a page index
pub const PAGE_KEYS: &[&str] = &["page", "pageIndex", "page_index", "pageNumber", "page_number"];

/// Request keys carrying a record offset
pub const OFFSET_KEYS: &[&str] = &["offset", "start", "skip"];

/// Request keys carrying a range token
pub const RANGE_PARAM_KEYS: &[&str] = &["range"];

/// Request header carrying a range token
pub const RANGE_HEADER: &str = "range";

/// Response header describing the returned slice
pub const CONTENT_RANGE_HEADER: &str = "content-range";

/// Response keys holding the record list, in precedence order
pub const LIST_KEYS: &[&str] = &["data", "results", "items", "transactions", "list", "rows"];

/// Response keys holding the total count, in precedence order
pub const TOTAL_KEYS: &[&str] = &["total", "totalCount", "count", "recordsTotal", "totalResults"];

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Coerce a JSON scalar into a non-negative integer.
///
/// Accepts integral numbers and strings holding one. Anything else is `None`,
/// so callers can tell "not a count" apart from zero.
pub fn json_to_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_u64() {
        assert_eq!(json_to_u64(&json!(50)), Some(50));
        assert_eq!(json_to_u64(&json!("25")), Some(25));
        assert_eq!(json_to_u64(&json!(" 7 ")), Some(7));
        assert_eq!(json_to_u64(&json!(10.0)), Some(10));
        assert_eq!(json_to_u64(&json!(0)), Some(0));

        assert_eq!(json_to_u64(&json!(-1)), None);
        assert_eq!(json_to_u64(&json!(1.5)), None);
        assert_eq!(json_to_u64(&json!("abc")), None);
        assert_eq!(json_to_u64(&json!(null)), None);
        assert_eq!(json_to_u64(&json!([1])), None);
    }

    #[test]
    fn test_backoff_serde() {
        let backoff: BackoffType = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(backoff, BackoffType::Linear);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }

    #[test]
    fn test_count_is_both_size_and_total_key() {
        assert!(SIZE_KEYS.contains(&"count"));
        assert!(TOTAL_KEYS.contains(&"count"));
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
