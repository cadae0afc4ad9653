//! Pagination metadata types
//!
//! `PaginationMeta` records where each recognized pagination field lives in a
//! request and what it currently holds. `Convention` is the tagged summary the
//! aggregator matches on.

use crate::codec::RangeBounds;
use crate::types::RANGE_PARAM_KEYS;
use serde::Serialize;

/// Where a pagination field lives inside a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldLocation {
    /// URL query string
    Query,
    /// Request body; `path` lists the parent keys (empty at top level)
    Body { path: Vec<String> },
}

impl FieldLocation {
    /// Top-level body field
    pub fn body() -> Self {
        Self::Body { path: Vec::new() }
    }

    /// Body field nested under `parent`
    pub fn nested(parent: impl Into<String>) -> Self {
        Self::Body {
            path: vec![parent.into()],
        }
    }
}

/// A numeric pagination field found in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    pub key: String,
    pub value: u64,
    pub location: FieldLocation,
}

impl FieldRef {
    pub fn new(key: impl Into<String>, value: u64, location: FieldLocation) -> Self {
        Self {
            key: key.into(),
            value,
            location,
        }
    }
}

/// A parameter carrying a range token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeParam {
    pub key: String,
    pub location: FieldLocation,
}

/// Which carrier the authoritative range came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    Param,
    Header,
}

/// A range convention found in a request.
///
/// A request may carry the range both as a parameter and as a header. The
/// header wins for the bounds; both carriers are rewritten together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeField {
    pub bounds: RangeBounds,
    /// Header unit, `None` when absent or blank
    pub unit: Option<String>,
    pub param: Option<RangeParam>,
    pub header: bool,
}

impl RangeField {
    pub fn source(&self) -> RangeSource {
        if self.header {
            RangeSource::Header
        } else {
            RangeSource::Param
        }
    }
}

/// Pagination fields detected on one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub size: Option<FieldRef>,
    pub page: Option<FieldRef>,
    pub offset: Option<FieldRef>,
    pub range: Option<RangeField>,
}

impl PaginationMeta {
    /// No recognized field: the request must be left untouched
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.page.is_none() && self.offset.is_none() && self.range.is_none()
    }

    /// Classify the detected fields
    pub fn convention(&self) -> Convention {
        if self.range.is_some() {
            Convention::RangeBased
        } else if self.page.is_some() || self.offset.is_some() {
            Convention::CursorBased
        } else if self.size.is_some() {
            Convention::SizeBased
        } else {
            Convention::NoPagination
        }
    }

    /// Records the request asks for, when it says
    pub fn requested_size(&self) -> Option<u64> {
        self.range
            .as_ref()
            .map(|r| r.bounds.len())
            .or_else(|| self.size.as_ref().map(|s| s.value))
    }

    /// Add a range convention carried by a `range` query parameter and header.
    ///
    /// Used when replaying a captured request that has no cursor of its own.
    #[must_use]
    pub fn with_synthesized_range(mut self, unit: &str) -> Self {
        self.range = Some(RangeField {
            bounds: RangeBounds::new(0, 0),
            unit: Some(unit.to_string()),
            param: Some(RangeParam {
                key: RANGE_PARAM_KEYS[0].to_string(),
                location: FieldLocation::Query,
            }),
            header: true,
        });
        self
    }
}

/// Pagination convention of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Nothing recognized
    NoPagination,
    /// Only a page size; no cursor to advance
    SizeBased,
    /// Page index and/or offset cursor
    CursorBased,
    /// Range token in a parameter or header
    RangeBased,
}

impl Convention {
    /// Whether a follow-up request can be built
    pub fn can_follow_up(&self) -> bool {
        matches!(self, Convention::CursorBased | Convention::RangeBased)
    }
}

/// Cursor values for one follow-up request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CursorPosition {
    pub page: Option<u64>,
    pub offset: Option<u64>,
    pub range: Option<RangeBounds>,
}
