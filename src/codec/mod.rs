//! Range codec module
//!
//! Parses and formats the size encodings that are not plain integers:
//!
//! - Range tokens in bodies and query parameters: `[0,49]`, `0-49`, `0,49`
//! - Range request headers: `transactions=0-49`
//! - Content-Range style response headers: `items 0-49/120`, `items 0-49/*`
//!
//! Every parser returns `None` on malformed input instead of a default, so a
//! caller can tell "not this convention" apart from a zero-sized page.

mod range;

pub use range::{
    format_range, format_range_header, parse_content_range, parse_range, parse_range_header,
    parse_range_value, ContentRange, RangeBounds, RangeHeader,
};
