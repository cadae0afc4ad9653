//! HTTP transport module
//!
//! Provides the `Transport` seam the interceptor and aggregator send through,
//! and a reqwest-backed implementation with retry, rate limiting, and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::Transport;

#[cfg(test)]
pub(crate) use transport::testing;

#[cfg(test)]
mod tests;
