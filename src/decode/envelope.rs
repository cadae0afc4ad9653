//! Record list and total extraction

use crate::codec::parse_content_range;
use crate::request::ResponseSnapshot;
use crate::types::{json_to_u64, JsonValue, Record, CONTENT_RANGE_HEADER, LIST_KEYS, TOTAL_KEYS};
use reqwest::header::HeaderMap;
use serde::Serialize;

/// Where a reported total came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalSource {
    /// A total field in the payload
    Field(String),
    /// The total component of a Content-Range header
    ContentRange,
    /// The length of a bare array payload; provisional only
    ItemCount,
}

/// Records and metadata extracted from one response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub items: Vec<Record>,
    /// Key holding the list, `None` when the payload is the array itself
    pub list_key: Option<String>,
    pub total: Option<u64>,
    pub total_source: Option<TotalSource>,
}

impl ResponseEnvelope {
    /// Key of the total field, when the total came from one
    pub fn total_key(&self) -> Option<&str> {
        match &self.total_source {
            Some(TotalSource::Field(key)) => Some(key),
            _ => None,
        }
    }

    /// Total reported by the server; a bare array length does not count
    pub fn reported_total(&self) -> Option<u64> {
        match self.total_source {
            Some(TotalSource::ItemCount) | None => None,
            Some(_) => self.total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Locate the record list and total of a payload.
pub fn interpret(payload: &JsonValue, headers: &HeaderMap) -> Option<ResponseEnvelope> {
    let header_total = || {
        headers
            .get(CONTENT_RANGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .and_then(|range| range.total)
    };

    match payload {
        JsonValue::Array(items) => {
            let (total, source) = match header_total() {
                Some(total) => (total, TotalSource::ContentRange),
                None => (items.len() as u64, TotalSource::ItemCount),
            };
            Some(ResponseEnvelope {
                items: items.clone(),
                list_key: None,
                total: Some(total),
                total_source: Some(source),
            })
        }
        JsonValue::Object(map) => {
            let (list_key, items) = LIST_KEYS.iter().find_map(|key| match map.get(*key) {
                Some(JsonValue::Array(items)) => Some(((*key).to_string(), items.clone())),
                _ => None,
            })?;

            let field_total = TOTAL_KEYS.iter().find_map(|key| {
                let total = json_to_u64(map.get(*key)?)?;
                Some((total, TotalSource::Field((*key).to_string())))
            });
            let (total, total_source) = match field_total
                .or_else(|| header_total().map(|t| (t, TotalSource::ContentRange)))
            {
                Some((total, source)) => (Some(total), Some(source)),
                None => (None, None),
            };

            Some(ResponseEnvelope {
                items,
                list_key: Some(list_key),
                total,
                total_source,
            })
        }
        _ => None,
    }
}

/// Parse and interpret a response body.
///
/// Returns the parsed payload alongside its envelope so callers can rebuild
/// the same shape later.
pub fn interpret_response(response: &ResponseSnapshot) -> Option<(JsonValue, ResponseEnvelope)> {
    let payload = response.json_body()?;
    let envelope = interpret(&payload, &response.headers)?;
    Some((payload, envelope))
}
