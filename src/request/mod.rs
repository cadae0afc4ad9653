//! Request and response snapshots
//!
//! Transport-neutral values passed between the interceptor, the pagination
//! rewriter and the aggregator. A `RequestDescriptor` is an immutable
//! snapshot of an outbound call; rewriting produces a modified copy.

mod form;
mod types;

pub use form::FormParams;
pub use types::{ParsedBody, RequestBody, RequestDescriptor, ResponseSnapshot};

#[cfg(test)]
mod tests;
