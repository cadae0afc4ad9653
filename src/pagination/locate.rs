//! Pagination convention detection
//!
//! Scans a request for the closed key lists in `crate::types`, in fixed
//! precedence: query parameters, then body fields, then the range header.
//! Matching is exact and case-sensitive.

use super::types::{FieldLocation, FieldRef, PaginationMeta, RangeField, RangeParam};
use crate::codec::{parse_range, parse_range_header, parse_range_value, RangeBounds};
use crate::request::{FormParams, ParsedBody, RequestDescriptor};
use crate::types::{
    json_to_u64, JsonObject, JsonValue, OFFSET_KEYS, PAGE_KEYS, RANGE_HEADER, RANGE_PARAM_KEYS,
    SIZE_KEYS,
};
use tracing::debug;

/// Detect the pagination fields of a request.
///
/// Returns an empty meta when nothing is recognized; that is the signal to
/// leave the request untouched, not an error.
pub fn locate(request: &RequestDescriptor) -> PaginationMeta {
    let query = request.query_params();
    let body = request.body.as_ref().and_then(|b| b.parse());

    let numeric = |keys: &[&str], nested: bool| {
        find_in_params(&query, keys, FieldLocation::Query)
            .or_else(|| body.as_ref().and_then(|b| find_in_body(b, keys, nested)))
    };

    let size = numeric(SIZE_KEYS, true);
    let page = numeric(PAGE_KEYS, false);
    let offset = numeric(OFFSET_KEYS, false);

    let mut range = find_range_in_params(&query, FieldLocation::Query)
        .or_else(|| body.as_ref().and_then(find_range_in_body))
        .map(|(param, bounds)| RangeField {
            bounds,
            unit: None,
            param: Some(param),
            header: false,
        });

    if let Some(header) = request.header(RANGE_HEADER).and_then(parse_range_header) {
        let param = range.take().and_then(|r| r.param);
        range = Some(RangeField {
            bounds: header.bounds,
            unit: header.unit,
            param,
            header: true,
        });
    }

    let meta = PaginationMeta {
        size,
        page,
        offset,
        range,
    };

    if !meta.is_empty() {
        debug!(
            "Detected {:?} pagination on {} {}",
            meta.convention(),
            request.method,
            request.url.path()
        );
    }

    meta
}

fn find_in_params(params: &FormParams, keys: &[&str], location: FieldLocation) -> Option<FieldRef> {
    keys.iter().find_map(|key| {
        let value = params.get(key)?.trim().parse().ok()?;
        Some(FieldRef::new(*key, value, location.clone()))
    })
}

fn find_in_body(body: &ParsedBody, keys: &[&str], nested: bool) -> Option<FieldRef> {
    match body {
        ParsedBody::Params(params) => find_in_params(params, keys, FieldLocation::body()),
        ParsedBody::Json(JsonValue::Object(map)) => {
            find_in_object(map, keys, FieldLocation::body()).or_else(|| {
                if !nested {
                    return None;
                }
                map.iter().find_map(|(parent, child)| match child {
                    JsonValue::Object(inner) => {
                        find_in_object(inner, keys, FieldLocation::nested(parent))
                    }
                    _ => None,
                })
            })
        }
        ParsedBody::Json(_) => None,
    }
}

fn find_in_object(map: &JsonObject, keys: &[&str], location: FieldLocation) -> Option<FieldRef> {
    keys.iter().find_map(|key| {
        let value = json_to_u64(map.get(*key)?)?;
        Some(FieldRef::new(*key, value, location.clone()))
    })
}

fn find_range_in_params(
    params: &FormParams,
    location: FieldLocation,
) -> Option<(RangeParam, RangeBounds)> {
    RANGE_PARAM_KEYS.iter().find_map(|key| {
        let bounds = parse_range(params.get(key)?)?;
        Some((
            RangeParam {
                key: (*key).to_string(),
                location: location.clone(),
            },
            bounds,
        ))
    })
}

fn find_range_in_body(body: &ParsedBody) -> Option<(RangeParam, RangeBounds)> {
    match body {
        ParsedBody::Params(params) => find_range_in_params(params, FieldLocation::body()),
        ParsedBody::Json(JsonValue::Object(map)) => RANGE_PARAM_KEYS.iter().find_map(|key| {
            let bounds = parse_range_value(map.get(*key)?)?;
            Some((
                RangeParam {
                    key: (*key).to_string(),
                    location: FieldLocation::body(),
                },
                bounds,
            ))
        }),
        ParsedBody::Json(_) => None,
    }
}
