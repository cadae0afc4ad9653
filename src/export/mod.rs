//! Export module
//!
//! Turns the records behind the most recent list request into a CSV file.
//!
//! # Overview
//!
//! - `Exporter` - Replays the captured request with a large page size and
//!   collects every record
//! - `build_csv` / `export_filename` - CSV text and timestamped file name
//! - `derive_display_value` - Best-effort money column, kept separate from
//!   the CSV layout so it can be swapped or left out

mod derive;
mod exporter;
mod writer;

pub use derive::derive_display_value;
pub use exporter::{ExportData, ExportFile, Exporter};
pub use writer::{build_csv, export_filename, Deriver};
