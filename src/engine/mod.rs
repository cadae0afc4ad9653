//! Aggregation engine
//!
//! Fills an under-sized page by issuing follow-up requests one at a time and
//! merging their records into a response shaped like the original.
//!
//! # Overview
//!
//! After the enlarged first page arrives, these guards are checked in order:
//!
//! 1. records loaded reach the requested size
//! 2. records loaded reach the reported total
//! 3. the request has no page, offset or range cursor to advance
//! 4. the follow-up ceiling is hit
//!
//! Otherwise the cursor advances by the records actually received and the
//! next page is fetched. An empty page, a failed request or an unrecognized
//! body ends the run with whatever was accumulated.

mod types;

pub use types::{
    AggregationOutcome, AggregationState, AggregationSummary, Cursor, StopReason,
};

use crate::codec::{parse_content_range, ContentRange};
use crate::decode::{interpret_response, ResponseEnvelope};
use crate::http::Transport;
use crate::pagination::{advance, PaginationMeta};
use crate::request::{RequestDescriptor, ResponseSnapshot};
use crate::types::{JsonValue, Record, CONTENT_RANGE_HEADER};
use reqwest::header::HeaderValue;
use tracing::{debug, info, warn};

/// Drives follow-up fetches over a transport
pub struct Aggregator<T> {
    transport: T,
    max_follow_ups: usize,
    default_unit: String,
}

impl<T: Transport> Aggregator<T> {
    /// Create an aggregator sending at most `max_follow_ups` extra requests
    pub fn new(transport: T, max_follow_ups: usize, default_unit: impl Into<String>) -> Self {
        Self {
            transport,
            max_follow_ups,
            default_unit: default_unit.into(),
        }
    }

    /// Fill `response` up to `limit` records.
    ///
    /// `request` and `meta` describe the request that produced `response`,
    /// after any enlargement. Follow-ups reuse its headers and body, swapping
    /// only the cursor fields. The returned response is the input unchanged
    /// when nothing was appended.
    pub async fn aggregate(
        &self,
        request: &RequestDescriptor,
        meta: &PaginationMeta,
        response: ResponseSnapshot,
        limit: usize,
    ) -> AggregationOutcome {
        if !response.is_success() {
            debug!("Initial response {} not aggregated", response.status.as_u16());
            return passthrough(response, StopReason::NetworkFailure);
        }
        let Some((payload, envelope)) = interpret_response(&response) else {
            debug!("Initial response has no recognizable record list");
            return passthrough(response, StopReason::Unrecognized);
        };

        let cursor = Cursor::after_first_page(meta, envelope.len() as u64);
        let window = meta.requested_size().unwrap_or(envelope.len() as u64);
        let initial_len = envelope.len();
        let mut state = AggregationState::new(
            envelope.items.clone(),
            envelope.reported_total(),
            cursor,
        );

        let stop_reason = if initial_len == 0 {
            StopReason::EmptyPage
        } else {
            self.fill(request, meta, &mut state, window, limit).await
        };

        info!(
            "Aggregation stopped ({stop_reason}): {} records over {} pages, total {:?}",
            state.loaded(),
            state.pages_fetched,
            state.total
        );

        let appended = state.loaded() > initial_len;
        let mut items = state.accumulated;
        if items.len() > limit {
            items.truncate(limit);
        }

        let summary = AggregationSummary {
            total: state.total,
            loaded: items.len(),
            pages_fetched: state.pages_fetched,
            stop_reason,
        };

        let response = if appended {
            repackage(
                response,
                &payload,
                &envelope,
                &items,
                state.total,
                &self.default_unit,
            )
        } else {
            response
        };

        AggregationOutcome {
            response,
            items,
            summary,
        }
    }

    async fn fill(
        &self,
        request: &RequestDescriptor,
        meta: &PaginationMeta,
        state: &mut AggregationState,
        window: u64,
        limit: usize,
    ) -> StopReason {
        loop {
            if state.loaded() >= limit {
                return StopReason::TargetReached;
            }
            if state.total_reached() {
                return StopReason::TotalReached;
            }
            if !meta.convention().can_follow_up() {
                return StopReason::NoConvention;
            }
            if state.cursor.exhausted {
                warn!("Cursor cannot advance past {:?}, keeping partial result", state.cursor);
                return StopReason::NoConvention;
            }
            if state.follow_ups >= self.max_follow_ups {
                warn!(
                    "Follow-up ceiling of {} reached with {} records",
                    self.max_follow_ups,
                    state.loaded()
                );
                return StopReason::PageCeiling;
            }

            let remaining = (limit - state.loaded()) as u64;
            let position = state.cursor.position(window.min(remaining));
            let next = advance(request, meta, &position, &self.default_unit);
            state.follow_ups += 1;
            debug!(
                "Follow-up {} for {} (page {:?}, offset {:?}, range {:?})",
                state.follow_ups, next.url, position.page, position.offset, position.range
            );

            let response = match self.transport.send(&next).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Follow-up request failed, keeping partial result: {e}");
                    return StopReason::NetworkFailure;
                }
            };
            if !response.is_success() {
                warn!(
                    "Follow-up request returned {}, keeping partial result",
                    response.status.as_u16()
                );
                return StopReason::NetworkFailure;
            }
            let Some((_, page)) = interpret_response(&response) else {
                warn!("Follow-up response has no recognizable record list");
                return StopReason::Unrecognized;
            };
            if page.is_empty() {
                return StopReason::EmptyPage;
            }

            let total = page.reported_total();
            state.absorb(page.items, total);
        }
    }
}

fn passthrough(response: ResponseSnapshot, stop_reason: StopReason) -> AggregationOutcome {
    AggregationOutcome {
        response,
        items: Vec::new(),
        summary: AggregationSummary {
            total: None,
            loaded: 0,
            pages_fetched: 0,
            stop_reason,
        },
    }
}

/// Rebuild the response around the merged records, keeping its shape
fn repackage(
    response: ResponseSnapshot,
    payload: &JsonValue,
    envelope: &ResponseEnvelope,
    items: &[Record],
    total: Option<u64>,
    default_unit: &str,
) -> ResponseSnapshot {
    let merged = match (&envelope.list_key, payload) {
        (Some(list_key), JsonValue::Object(map)) => {
            let mut map = map.clone();
            map.insert(list_key.clone(), JsonValue::Array(items.to_vec()));
            if let (Some(total_key), Some(total)) = (envelope.total_key(), total) {
                map.insert(total_key.to_string(), JsonValue::from(total));
            }
            JsonValue::Object(map)
        }
        _ => JsonValue::Array(items.to_vec()),
    };

    // an unreadable content-range is rebuilt rather than left stale
    let unit = response.header(CONTENT_RANGE_HEADER).map(|value| {
        parse_content_range(value).map_or_else(|| default_unit.to_string(), |cr| cr.unit)
    });
    let mut response = response.with_json_body(&merged);

    if let Some(unit) = unit {
        let patched = ContentRange {
            unit,
            start: 0,
            end: (items.len() as u64).saturating_sub(1),
            total,
        };
        match HeaderValue::from_str(&patched.to_string()) {
            Ok(value) => {
                response.headers.insert(CONTENT_RANGE_HEADER, value);
            }
            Err(e) => warn!("Could not patch content-range: {e}"),
        }
    }

    response
}
