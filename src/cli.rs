//! Command-line interface definitions.
//!
//! ```bash
//! # Scan with the default fan-out strategy
//! dupfind scan ~/Downloads
//!
//! # At most 8 files open at once, JSON report
//! dupfind scan ~/Downloads --io-limit 8 --output json
//!
//! # Compare against the single-walker pipeline
//! dupfind -v scan ~/Downloads --strategy pipeline --workers 4
//!
//! # One walker per directory, memory-map files of 16 MiB and up
//! dupfind scan ~/Downloads -s multiwalker --mmap-threshold 16777216
//!
//! # Create 1000 small fixture files under ./test
//! dupfind generate 1000
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::duplicates::Strategy;

/// Concurrent duplicate file finder.
///
/// Walks a directory tree, hashes every regular file with BLAKE3 and
/// reports the groups of files whose contents are identical.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree for duplicate files
    Scan(ScanArgs),
    /// Generate files with random content for testing
    Generate(GenerateArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Traversal strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Maximum files or directories open at once
    #[arg(long, value_name = "K")]
    pub io_limit: Option<usize>,

    /// Threads in the task pool (fanout and multiwalker)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Hashing threads (pipeline and multiwalker)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Memory-map files of at least this many bytes instead of streaming them
    #[arg(long, value_name = "BYTES")]
    pub mmap_threshold: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl ScanArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(io_limit) = self.io_limit {
            config.io_limit = io_limit;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(threshold) = self.mmap_threshold {
            config.mmap_threshold = Some(threshold);
        }
    }
}

/// Arguments for the generate subcommand.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of files to create
    #[arg(value_name = "COUNT")]
    pub count: usize,

    /// Directory to create them in
    #[arg(value_name = "DIR", default_value = "test")]
    pub dir: PathBuf,

    /// Letters per file
    #[arg(short, long, value_name = "N", default_value_t = crate::generator::DEFAULT_LENGTH)]
    pub length: usize,

    /// Seed for reproducible content
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

/// Report format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain listing of each duplicate group
    #[default]
    Text,
    /// JSON document with groups and summary
    Json,
}

impl Cli {
    /// Whether errors should be reported as JSON.
    #[must_use]
    pub fn json_errors(&self) -> bool {
        matches!(
            &self.command,
            Commands::Scan(ScanArgs {
                output: OutputFormat::Json,
                ..
            })
        )
    }
}
