//! Response interpretation module
//!
//! Finds the record list and the reported total in a JSON payload of unknown
//! shape.
//!
//! # Overview
//!
//! - A top-level array is the record list itself
//! - Otherwise the first key of `LIST_KEYS` holding an array is the list
//! - The total comes from the first numeric key of `TOTAL_KEYS`, falling back
//!   to the total component of a `Content-Range` header
//!
//! A payload without a recognizable list is left alone: `interpret` returns
//! `None` and the response must pass through unmodified.

mod envelope;

pub use envelope::{interpret, interpret_response, ResponseEnvelope, TotalSource};
