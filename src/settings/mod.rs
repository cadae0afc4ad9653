//! Settings module
//!
//! Persists the desired page size between runs. The value both gates
//! enlargement and sets the target size handed to the rewriter.
//!
//! # Overview
//!
//! - `Settings` - Raw key/value document as stored on disk
//! - `SettingsStore` - File-based persistence with atomic writes, or an
//!   in-memory store for tests and embedding

mod store;
mod types;

pub use store::SettingsStore;
pub use types::{Settings, DESIRED_PAGE_SIZE_KEY};

#[cfg(test)]
mod store_tests;
