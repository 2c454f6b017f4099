//! Command-line interface for corpus-forge.
//!
//! Provides commands for quality analysis, pattern mining, clustering,
//! sampling and the full curation run.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
