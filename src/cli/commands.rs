//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pagination filler for list endpoints
#[derive(Parser, Debug)]
#[command(name = "pagefill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings file holding the desired page size (JSON)
    #[arg(short, long, global = true, default_value = "pagefill-settings.json")]
    pub settings: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the detected pagination convention and the enlarged request
    Inspect {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Send a request through the interceptor and print the merged body
    Fetch {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Capture a request and export every record behind it as CSV
    Export {
        #[command(flatten)]
        request: RequestArgs,

        /// Directory the CSV file is written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show or set the desired page size
    PageSize {
        /// New desired page size
        value: Option<u64>,
    },

    /// Start the reverse proxy
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Base URL requests are forwarded to
        #[arg(short, long)]
        upstream: String,
    },
}

/// A request described on the command line
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request URL
    #[arg(long)]
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body, sent verbatim
    #[arg(short, long)]
    pub body: Option<String>,
}
