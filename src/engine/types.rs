//! Engine types
//!
//! Per-call aggregation state, the follow-up cursor, and the outcome handed
//! back to the interceptor.

use crate::codec::RangeBounds;
use crate::pagination::{CursorPosition, PaginationMeta};
use crate::request::ResponseSnapshot;
use crate::types::Record;
use serde::Serialize;

/// Why an aggregation run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Accumulated records reached the requested size
    TargetReached,
    /// Accumulated records reached the reported total
    TotalReached,
    /// The request carries no cursor that could be advanced
    NoConvention,
    /// A page came back without records
    EmptyPage,
    /// A request failed or returned an error status
    NetworkFailure,
    /// A response did not contain a recognizable record list
    Unrecognized,
    /// The follow-up request ceiling was hit
    PageCeiling,
}

impl StopReason {
    /// Whether the run ended before the data was known to be complete
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            StopReason::NetworkFailure | StopReason::Unrecognized | StopReason::PageCeiling
        )
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::TargetReached => "target reached",
            StopReason::TotalReached => "total reached",
            StopReason::NoConvention => "no cursor convention",
            StopReason::EmptyPage => "empty page",
            StopReason::NetworkFailure => "network failure",
            StopReason::Unrecognized => "unrecognized response",
            StopReason::PageCeiling => "page ceiling",
        };
        f.write_str(text)
    }
}

/// Cursor for the next follow-up request.
///
/// Every cursor the original request carried advances together: the page
/// index by one, offset and range start by the records actually received.
/// A cursor that would move past `u64::MAX` is exhausted and stays put.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub page: Option<u64>,
    pub offset: Option<u64>,
    pub range_start: Option<u64>,
    pub exhausted: bool,
}

impl Cursor {
    /// Position right after the first page
    pub fn after_first_page(meta: &PaginationMeta, received: u64) -> Self {
        let mut cursor = Self {
            page: meta.page.as_ref().map(|p| p.value),
            offset: meta.offset.as_ref().map(|o| o.value),
            range_start: meta.range.as_ref().map(|r| r.bounds.start),
            exhausted: false,
        };
        cursor.advance(received);
        cursor
    }

    /// Move past a page of `received` records
    pub fn advance(&mut self, received: u64) {
        if self.exhausted {
            return;
        }
        let next = (
            step(self.page, 1),
            step(self.offset, received),
            step(self.range_start, received),
        );
        match next {
            (Some(page), Some(offset), Some(range_start)) => {
                self.page = page;
                self.offset = offset;
                self.range_start = range_start;
            }
            _ => self.exhausted = true,
        }
    }

    /// Concrete values for a request asking for `window` records
    pub fn position(&self, window: u64) -> CursorPosition {
        CursorPosition {
            page: self.page,
            offset: self.offset,
            range: self
                .range_start
                .map(|start| RangeBounds::new(start, start.saturating_add(window.max(1) - 1))),
        }
    }
}

/// `None` when a present cursor overflows
fn step(value: Option<u64>, by: u64) -> Option<Option<u64>> {
    match value {
        Some(v) => v.checked_add(by).map(Some),
        None => Some(None),
    }
}

/// Mutable state of one aggregation run
#[derive(Debug, Clone)]
pub struct AggregationState {
    pub accumulated: Vec<Record>,
    /// First reported total seen
    pub total: Option<u64>,
    /// Pages received, the initial one included
    pub pages_fetched: usize,
    /// Follow-up requests sent, failed ones included
    pub follow_ups: usize,
    pub cursor: Cursor,
}

impl AggregationState {
    pub fn new(first_page: Vec<Record>, total: Option<u64>, cursor: Cursor) -> Self {
        Self {
            accumulated: first_page,
            total,
            pages_fetched: 1,
            follow_ups: 0,
            cursor,
        }
    }

    /// Append a follow-up page
    pub fn absorb(&mut self, page: Vec<Record>, total: Option<u64>) {
        self.pages_fetched += 1;
        if self.total.is_none() {
            self.total = total;
        }
        self.cursor.advance(page.len() as u64);
        self.accumulated.extend(page);
    }

    pub fn loaded(&self) -> usize {
        self.accumulated.len()
    }

    /// Whether the reported total has been reached
    pub fn total_reached(&self) -> bool {
        self.total
            .is_some_and(|total| self.accumulated.len() as u64 >= total)
    }
}

/// Summary published after every intercepted list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationSummary {
    pub total: Option<u64>,
    pub loaded: usize,
    pub pages_fetched: usize,
    pub stop_reason: StopReason,
}

/// Result of an aggregation run
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    /// Response to hand back to the caller
    pub response: ResponseSnapshot,
    /// Merged records, truncated to the limit
    pub items: Vec<Record>,
    pub summary: AggregationSummary,
}

impl AggregationOutcome {
    /// Whether follow-up pages were merged into the response
    pub fn merged(&self) -> bool {
        self.summary.pages_fetched > 1
    }
}
