//! CLI module
//!
//! Command-line interface for scanning storage maps.
//!
//! # Commands
//!
//! - `collections` - List configured collections
//! - `keys` - Print keys page by page
//! - `entries` - Dump entries as JSON lines
//! - `count` - Count entries and pages

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{Runner, Target};
