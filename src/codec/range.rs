//! Range token and Content-Range parsing

use crate::types::JsonValue;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DASH_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap());

static COMMA_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*,\s*(\d+)$").unwrap());

static CONTENT_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s+(\d+)-(\d+)/(\d+|\*)$").unwrap());

/// Inclusive record bounds `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeBounds {
    pub start: u64,
    pub end: u64,
}

impl RangeBounds {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of records covered, zero for an inverted range
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed `unit=start-end` request header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeHeader {
    /// Unit before `=`, `None` when blank
    pub unit: Option<String>,
    pub bounds: RangeBounds,
}

/// A parsed `unit start-end/total` response header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRange {
    pub unit: String,
    pub start: u64,
    pub end: u64,
    /// `None` when the server sent `*`
    pub total: Option<u64>,
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "{} {}-{}/{}", self.unit, self.start, self.end, total),
            None => write!(f, "{} {}-{}/*", self.unit, self.start, self.end),
        }
    }
}

/// Parse a range token.
///
/// Accepts a JSON array whose first two elements are integers (`[0,49]`),
/// a dash token (`0-49`) or a comma token (`0,49`).
pub fn parse_range(value: &str) -> Option<RangeBounds> {
    let trimmed = value.trim();

    if trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<JsonValue>(trimmed) {
            return parse_range_value(&parsed);
        }
    }

    let captures = DASH_RANGE
        .captures(trimmed)
        .or_else(|| COMMA_RANGE.captures(trimmed))?;
    let start = captures[1].parse().ok()?;
    let end = captures[2].parse().ok()?;
    Some(RangeBounds::new(start, end))
}

/// Parse a range carried as a JSON value (array literal or string token)
pub fn parse_range_value(value: &JsonValue) -> Option<RangeBounds> {
    match value {
        JsonValue::Array(items) if items.len() >= 2 => {
            let start = crate::types::json_to_u64(&items[0])?;
            let end = crate::types::json_to_u64(&items[1])?;
            Some(RangeBounds::new(start, end))
        }
        JsonValue::String(s) => parse_range(s),
        _ => None,
    }
}

/// Format a range token for bodies and query parameters
pub fn format_range(start: u64, end: u64) -> String {
    format!("[{start},{end}]")
}

/// Parse a `unit=start-end` range request header
pub fn parse_range_header(value: &str) -> Option<RangeHeader> {
    let mut parts = value.split('=');
    let unit = parts.next()?.trim();
    let range = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let bounds = parse_range(range)?;
    let unit = if unit.is_empty() {
        None
    } else {
        Some(unit.to_string())
    };
    Some(RangeHeader { unit, bounds })
}

/// Format a range request header value
pub fn format_range_header(unit: &str, start: u64, end: u64) -> String {
    format!("{unit}={start}-{end}")
}

/// Parse a Content-Range style header (`items 0-49/120` or `items 0-49/*`)
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let captures = CONTENT_RANGE.captures(value.trim())?;
    let total = match &captures[4] {
        "*" => None,
        digits => Some(digits.parse().ok()?),
    };
    Some(ContentRange {
        unit: captures[1].to_string(),
        start: captures[2].parse().ok()?,
        end: captures[3].parse().ok()?,
        total,
    })
}
