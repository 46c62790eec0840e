//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bridge SDK storage scanner
#[derive(Parser, Debug)]
#[command(name = "bridge-sdk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SDK configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Chain node endpoint (overrides the config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Block hash to read storage at
    #[arg(long, global = true, conflicts_with = "finalized")]
    pub at: Option<String>,

    /// Pin the scan to the latest finalized block
    #[arg(long, global = true)]
    pub finalized: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured collections
    Collections,

    /// List the keys of a collection, page by page
    Keys {
        /// Collection name, or a hex storage prefix
        collection: String,

        /// Entries requested per page
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },

    /// Dump the entries of a collection
    Entries {
        /// Collection name, or a hex storage prefix
        collection: String,

        /// Entries requested per page
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,

        /// Stop after this many entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count the entries of a collection
    Count {
        /// Collection name, or a hex storage prefix
        collection: String,

        /// Entries requested per page
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
