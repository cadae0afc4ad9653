//! Request rewriting
//!
//! `rewrite` enlarges the page a request asks for; `advance` moves its cursor
//! for a follow-up fetch. Both only touch fields that `locate` found, so a
//! rewritten request never carries a convention the server did not already
//! use. The input descriptor is never mutated.

use super::types::{CursorPosition, FieldLocation, PaginationMeta, RangeField};
use crate::codec::{format_range, format_range_header, RangeBounds};
use crate::request::{FormParams, RequestBody, RequestDescriptor};
use crate::types::{JsonValue, RANGE_HEADER};
use tracing::{debug, warn};

/// New value for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditValue {
    Count(u64),
    Range(RangeBounds),
}

/// One pending field change
#[derive(Debug, Clone)]
enum FieldEdit {
    Field {
        key: String,
        location: FieldLocation,
        value: EditValue,
    },
    Header {
        unit: String,
        bounds: RangeBounds,
    },
}

/// Enlarge a request to `target` records.
///
/// The size field becomes `max(current, target)` and a range restarts at
/// `[0, target - 1]`. Page and offset cursors are left alone. Returns an
/// unchanged copy when `meta` is empty or nothing needs to change.
pub fn rewrite(
    request: &RequestDescriptor,
    meta: &PaginationMeta,
    target: u64,
    default_unit: &str,
) -> RequestDescriptor {
    if meta.is_empty() || target == 0 {
        return request.clone();
    }

    let mut edits = Vec::new();

    if let Some(size) = &meta.size {
        if size.value < target {
            edits.push(FieldEdit::Field {
                key: size.key.clone(),
                location: size.location.clone(),
                value: EditValue::Count(target),
            });
        }
    }

    if let Some(range) = &meta.range {
        let bounds = RangeBounds::new(0, target - 1);
        if range.bounds != bounds {
            range_edits(range, bounds, default_unit, &mut edits);
        }
    }

    if edits.is_empty() {
        return request.clone();
    }

    debug!(
        "Rewriting {} {} for {} records ({} field(s))",
        request.method,
        request.url.path(),
        target,
        edits.len()
    );
    apply_edits(request, &edits)
}

/// Build a follow-up request with the cursor fields moved to `cursor`.
///
/// Headers, credentials and body shape are reused; only cursor fields change.
pub fn advance(
    request: &RequestDescriptor,
    meta: &PaginationMeta,
    cursor: &CursorPosition,
    default_unit: &str,
) -> RequestDescriptor {
    let mut edits = Vec::new();

    if let (Some(page), Some(next)) = (&meta.page, cursor.page) {
        edits.push(FieldEdit::Field {
            key: page.key.clone(),
            location: page.location.clone(),
            value: EditValue::Count(next),
        });
    }

    if let (Some(offset), Some(next)) = (&meta.offset, cursor.offset) {
        edits.push(FieldEdit::Field {
            key: offset.key.clone(),
            location: offset.location.clone(),
            value: EditValue::Count(next),
        });
    }

    if let (Some(range), Some(bounds)) = (&meta.range, cursor.range) {
        range_edits(range, bounds, default_unit, &mut edits);
    }

    apply_edits(request, &edits)
}

fn range_edits(
    range: &RangeField,
    bounds: RangeBounds,
    default_unit: &str,
    edits: &mut Vec<FieldEdit>,
) {
    if let Some(param) = &range.param {
        edits.push(FieldEdit::Field {
            key: param.key.clone(),
            location: param.location.clone(),
            value: EditValue::Range(bounds),
        });
    }
    if range.header {
        edits.push(FieldEdit::Header {
            unit: range
                .unit
                .clone()
                .unwrap_or_else(|| default_unit.to_string()),
            bounds,
        });
    }
}

fn apply_edits(request: &RequestDescriptor, edits: &[FieldEdit]) -> RequestDescriptor {
    let mut next = request.clone();

    let query_edits: Vec<_> = edits.iter().filter(|e| is_query(e)).collect();
    if !query_edits.is_empty() {
        let mut params = next.query_params();
        for edit in &query_edits {
            set_param(&mut params, edit);
        }
        next.set_query_params(&params);
    }

    let body_edits: Vec<_> = edits.iter().filter(|e| is_body(e)).collect();
    if !body_edits.is_empty() {
        next.body = next.body.take().map(|body| edit_body(body, &body_edits));
    }

    for edit in edits {
        if let FieldEdit::Header { unit, bounds } = edit {
            let value = format_range_header(unit, bounds.start, bounds.end);
            if let Err(e) = next.set_header(RANGE_HEADER, &value) {
                warn!("Keeping original range header: {e}");
            }
        }
    }

    next
}

fn is_query(edit: &FieldEdit) -> bool {
    matches!(
        edit,
        FieldEdit::Field {
            location: FieldLocation::Query,
            ..
        }
    )
}

fn is_body(edit: &FieldEdit) -> bool {
    matches!(
        edit,
        FieldEdit::Field {
            location: FieldLocation::Body { .. },
            ..
        }
    )
}

fn set_param(params: &mut FormParams, edit: &FieldEdit) {
    if let FieldEdit::Field { key, value, .. } = edit {
        let text = match value {
            EditValue::Count(n) => n.to_string(),
            EditValue::Range(bounds) => format_range(bounds.start, bounds.end),
        };
        params.set(key, text);
    }
}

fn edit_body(body: RequestBody, edits: &[&FieldEdit]) -> RequestBody {
    match body {
        RequestBody::Text(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                let Ok(mut json) = serde_json::from_str::<JsonValue>(trimmed) else {
                    return RequestBody::Text(text);
                };
                for edit in edits {
                    set_json(&mut json, edit);
                }
                RequestBody::Text(json.to_string())
            } else {
                let mut params = FormParams::parse(trimmed);
                for edit in edits {
                    set_param(&mut params, edit);
                }
                RequestBody::Text(params.to_urlencoded())
            }
        }
        RequestBody::Form(mut params) => {
            for edit in edits {
                set_param(&mut params, edit);
            }
            RequestBody::Form(params)
        }
        RequestBody::Fields(mut params) => {
            for edit in edits {
                set_param(&mut params, edit);
            }
            RequestBody::Fields(params)
        }
        binary @ RequestBody::Binary(_) => binary,
    }
}

/// Set a JSON field, keeping the literal type the body already used
fn set_json(json: &mut JsonValue, edit: &FieldEdit) {
    let FieldEdit::Field {
        key,
        location: FieldLocation::Body { path },
        value,
    } = edit
    else {
        return;
    };

    let mut target = json;
    for parent in path {
        match target.get_mut(parent.as_str()) {
            Some(child) => target = child,
            None => return,
        }
    }
    let Some(object) = target.as_object_mut() else {
        return;
    };

    let existing = object.get(key.as_str());
    let as_string = matches!(existing, Some(JsonValue::String(_)));
    let replacement = match value {
        EditValue::Count(n) if as_string => JsonValue::String(n.to_string()),
        EditValue::Count(n) => JsonValue::from(*n),
        EditValue::Range(bounds) if as_string => {
            JsonValue::String(format_range(bounds.start, bounds.end))
        }
        EditValue::Range(bounds) => JsonValue::from(vec![bounds.start, bounds.end]),
    };
    object.insert(key.clone(), replacement);
}
