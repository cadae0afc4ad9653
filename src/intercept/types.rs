//! Captured request and payload cells

use crate::request::RequestDescriptor;
use crate::types::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Most recent in-scope request, kept for export replay
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    /// The request as the caller sent it, before enlargement
    pub request: RequestDescriptor,
    pub captured_at: DateTime<Utc>,
}

/// Records of the most recent in-scope response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedPayload {
    pub items: Vec<Record>,
    /// Reported total, or the record count when none was reported
    pub total: u64,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPayload {
    pub fn new(items: Vec<Record>, total: Option<u64>) -> Self {
        let total = total.unwrap_or(items.len() as u64);
        Self {
            items,
            total,
            captured_at: Utc::now(),
        }
    }

    /// Whether every record of the result set is already here
    pub fn is_complete(&self) -> bool {
        self.items.len() as u64 >= self.total
    }
}
