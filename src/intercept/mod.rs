//! Interception middleware
//!
//! Sits between a caller and a [`Transport`](crate::http::Transport): requests
//! to the list endpoint are enlarged, sent, and topped up by the aggregation
//! engine before the merged response is handed back. Everything else is
//! forwarded untouched.
//!
//! # Overview
//!
//! - `Interceptor` - The middleware; also a `Transport` itself, so it can be
//!   stacked wherever a transport is expected
//! - `CapturedRequest` / `CapturedPayload` - Last-write-wins cells read by the
//!   exporter

mod interceptor;
mod types;

pub use interceptor::Interceptor;
pub use types::{CapturedPayload, CapturedRequest};

#[cfg(test)]
mod tests;
