//! Duplicate finder: strategy selection, completion and reporting.
//!
//! # Overview
//!
//! [`DuplicateFinder`] validates the root, runs the configured [`Strategy`]
//! to build the digest grouping, then keeps the groups with two or more
//! members and summarises the run. Every strategy shares the walker rules,
//! the hasher and the per-file error policy:
//!
//! - [`Strategy::Sequential`] walks and hashes on the calling thread.
//! - [`Strategy::Pipeline`] walks on one thread and feeds a fixed set of
//!   hashing threads.
//! - [`Strategy::MultiWalker`] lists every directory in its own task and
//!   feeds the same fixed set of hashing threads from all of them.
//! - [`Strategy::FanOut`] spawns a task per directory and per file, bounds
//!   concurrent IO with a [`Limiter`](crate::scanner::Limiter), and joins
//!   everything through a [`TaskGroup`](crate::scanner::TaskGroup).
//!
//! A run moves through `Init → Traversing → Draining → Aggregating →
//! Reporting → Done`; a fatal traversal error ends it in `Aborted` and no
//! report is produced.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig, Strategy};
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_strategy(Strategy::FanOut)
//!     .with_io_limit(8);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

use super::aggregator::Aggregate;
use super::groups::{DuplicateGroup, DuplicateGroups};
use super::{fanout, multiwalker, pipeline, sequential};
use crate::scanner::{HashError, Hasher, Limiter, ScanError, ScanStats, Walker, DEFAULT_BUFFER_SIZE};

/// How the tree is traversed and hashed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Walk and hash on one thread
    Sequential,
    /// One walker thread feeding a fixed pool of hashing threads
    Pipeline,
    /// One walker task per directory feeding a fixed pool of hashing threads
    #[value(name = "multiwalker")]
    MultiWalker,
    /// One task per directory and per file, IO bounded by a token pool
    #[default]
    #[value(name = "fanout")]
    FanOut,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Pipeline => write!(f, "pipeline"),
            Strategy::MultiWalker => write!(f, "multiwalker"),
            Strategy::FanOut => write!(f, "fanout"),
        }
    }
}

/// Lifecycle of a scan, logged at debug level as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Traversing,
    Draining,
    Aggregating,
    Reporting,
    Done,
    Aborted,
}

impl Phase {
    pub(crate) fn enter(self, root: &Path) {
        log::debug!("{:?}: {}", self, root.display());
    }
}

fn available_processors() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Configuration for the duplicate finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderConfig {
    /// Traversal strategy.
    pub strategy: Strategy,
    /// Limiter capacity: files or directories open at once.
    pub io_limit: usize,
    /// Size of the rayon pool hosting fan-out and multi-walker tasks.
    pub threads: usize,
    /// Hashing threads for the pipeline and multi-walker strategies.
    pub workers: usize,
    /// Read buffer size for hashing.
    pub buffer_size: usize,
    /// Memory-map files at least this large instead of streaming them.
    pub mmap_threshold: Option<u64>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            io_limit: Limiter::default_capacity(),
            threads: available_processors(),
            workers: 2 * available_processors(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            mmap_threshold: None,
        }
    }
}

impl FinderConfig {
    /// Set the traversal strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the limiter capacity (at least one).
    #[must_use]
    pub fn with_io_limit(mut self, limit: usize) -> Self {
        self.io_limit = limit.max(1);
        self
    }

    /// Set the task pool size (at least one).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the hashing thread count (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the hashing read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Memory-map files of at least `threshold` bytes; `None` always streams.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: Option<u64>) -> Self {
        self.mmap_threshold = threshold;
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Strategy that produced the result
    pub strategy: Strategy,
    /// Directories enumerated
    pub directories: u64,
    /// Hashable files discovered
    pub files_discovered: u64,
    /// Total size of the hashable files discovered
    pub bytes_discovered: u64,
    /// Files hashed successfully
    pub files_hashed: usize,
    /// Bytes hashed successfully
    pub bytes_hashed: u64,
    /// Entries that vanished between listing and inspection
    pub vanished: u64,
    /// Files dropped because they could not be opened or read
    pub skipped: Vec<HashError>,
    /// Number of groups with two or more members
    pub duplicate_groups: usize,
    /// Duplicate files beyond the first copy in each group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Limiter capacity in effect
    pub io_limit: usize,
    /// Most IO operations observed in flight at once
    pub peak_io: usize,
    /// Tasks spawned (fan-out and multi-walker only)
    pub tasks_spawned: u64,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Number of files dropped from the grouping.
    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.skipped.len()
    }

    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format hashed bytes as a human-readable string.
    #[must_use]
    pub fn hashed_display(&self) -> String {
        ByteSize(self.bytes_hashed).to_string()
    }
}

/// Errors that end a scan without a report.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory could not be enumerated.
    #[error("could not traverse directory tree: {0}")]
    Traversal(#[from] ScanError),

    /// The task pool could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A scan thread could not be started.
    #[error("failed to start scan thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The aggregator thread died before handing back its result.
    #[error("aggregator thread panicked")]
    Aggregator,
}

/// What a strategy hands back to the finder.
#[derive(Debug, Default)]
pub(crate) struct StrategyRun {
    pub groups: DuplicateGroups,
    pub skipped: Vec<HashError>,
    pub bytes_hashed: u64,
    pub peak_io: usize,
    pub tasks_spawned: u64,
}

impl StrategyRun {
    pub(crate) fn new(aggregate: Aggregate, peak_io: usize, tasks_spawned: u64) -> Self {
        Self {
            groups: aggregate.groups,
            skipped: aggregate.skipped,
            bytes_hashed: aggregate.bytes_hashed,
            peak_io,
            tasks_spawned,
        }
    }
}

/// Duplicate finder that orchestrates one scan.
#[derive(Debug, Clone)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new()
            .with_buffer_size(config.buffer_size)
            .with_mmap_threshold(config.mmap_threshold);
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all groups of identical files under `root`.
    ///
    /// Runs the configured strategy to completion: every task it spawned
    /// has finished and the aggregator has handed back its grouping before
    /// anything is filtered. Symbolic links are not followed, and empty or
    /// non-regular files are never hashed.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory to scan. It must exist and be a directory.
    ///
    /// # Returns
    ///
    /// The groups with two or more members, largest reclaimable space
    /// first, and a [`ScanSummary`] of the run. Paths within a group are in
    /// the order their hashes completed, which is not stable across runs
    /// for the concurrent strategies.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the root is missing or not a directory, if
    /// any directory below it cannot be enumerated, or if the scan's threads
    /// cannot be started. Unreadable files are not errors; they are listed
    /// in [`ScanSummary::skipped`].
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start = Instant::now();
        Phase::Init.enter(root);
        validate_root(root)?;

        log::info!(
            "Scanning {} ({} strategy, io limit {})",
            root.display(),
            self.config.strategy,
            self.config.io_limit
        );

        let stats = Arc::new(ScanStats::default());
        let walker = Walker::new().with_stats(Arc::clone(&stats));

        let run = match self.config.strategy {
            Strategy::Sequential => sequential::run(root, &walker, &self.hasher),
            Strategy::Pipeline => pipeline::run(root, &self.config, &walker, &self.hasher),
            Strategy::MultiWalker => {
                multiwalker::run(root, &self.config, &walker, &self.hasher)
            }
            Strategy::FanOut => fanout::run(root, &self.config, &walker, &self.hasher),
        };
        let run = match run {
            Ok(run) => run,
            Err(err) => {
                Phase::Aborted.enter(root);
                log::error!("{err}");
                return Err(err);
            }
        };

        Phase::Reporting.enter(root);
        let files_hashed = run.groups.total_paths();
        let groups = run.groups.into_duplicates();

        let summary = ScanSummary {
            strategy: self.config.strategy,
            directories: stats.dirs_visited(),
            files_discovered: stats.files_discovered(),
            bytes_discovered: stats.bytes_discovered(),
            files_hashed,
            bytes_hashed: run.bytes_hashed,
            vanished: stats.vanished(),
            duplicate_groups: groups.len(),
            duplicate_files: groups.iter().map(|g| g.len() - 1).sum(),
            reclaimable_space: groups.iter().map(DuplicateGroup::wasted_space).sum(),
            io_limit: match self.config.strategy {
                Strategy::Sequential => 1,
                _ => self.config.io_limit,
            },
            peak_io: run.peak_io,
            tasks_spawned: run.tasks_spawned,
            skipped: run.skipped,
            scan_duration: start.elapsed(),
        };

        if !summary.skipped.is_empty() {
            log::warn!(
                "{} file(s) could not be read and were left out",
                summary.skipped_files()
            );
        }
        log::info!(
            "Scan complete: {} files hashed ({}), {} duplicate groups, {} reclaimable",
            summary.files_hashed,
            summary.hashed_display(),
            summary.duplicate_groups,
            summary.reclaimable_display()
        );
        Phase::Done.enter(root);

        Ok((groups, summary))
    }
}

fn validate_root(root: &Path) -> Result<(), FinderError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(FinderError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinderError::PathNotFound(root.to_path_buf()))
        }
        Err(e) => Err(ScanError::from_io(root.to_path_buf(), e).into()),
    }
}
