//! CLI module
//!
//! Command-line interface for inspecting, fetching and exporting list
//! requests.
//!
//! # Commands
//!
//! - `inspect` - Show the detected convention and the enlarged request
//! - `fetch` - Send a request through the interceptor
//! - `export` - Write every record behind a request to CSV
//! - `page-size` - Show or set the desired page size
//! - `serve` - Start the reverse proxy

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, RequestArgs};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
