//! Pagination module
//!
//! Detects which pagination convention a captured request uses and rewrites
//! it: page size keys, page index and offset cursors, and range tokens carried
//! in a query parameter, a body field or a `range` header.
//!
//! # Overview
//!
//! - [`locate`] scans a request and returns a [`PaginationMeta`]
//! - [`rewrite`] enlarges the requested page
//! - [`advance`] moves the cursor for a follow-up fetch
//!
//! An empty meta means the request is not paginated and must pass through
//! untouched.

mod locate;
mod rewrite;
mod types;

pub use locate::locate;
pub use rewrite::{advance, rewrite};
pub use types::{
    Convention, CursorPosition, FieldLocation, FieldRef, PaginationMeta, RangeField, RangeParam,
    RangeSource,
};
