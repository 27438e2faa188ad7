//! Scanner module for directory traversal and file hashing.
//!
//! This module provides the building blocks every scan strategy shares:
//! - [`walker`]: single-directory enumeration and entry classification
//! - [`hasher`]: BLAKE3 content hashing (streaming)
//! - [`limiter`]: bounded token pool capping concurrent IO operations
//! - [`tasks`]: completion tracking for dynamically spawned tasks
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Discovered, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new();
//! walker
//!     .visit(Path::new("."), |item| match item {
//!         Discovered::Directory(dir) => println!("dir  {}", dir.display()),
//!         Discovered::File(file) => println!("file {} ({} bytes)", file.path.display(), file.size),
//!     })
//!     .unwrap();
//! ```

pub mod hasher;
pub mod limiter;
pub mod tasks;
pub mod walker;

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher, DEFAULT_BUFFER_SIZE};
pub use limiter::{Limiter, Permit};
pub use tasks::TaskGroup;
pub use walker::{Discovered, Walker};

/// Metadata for a discovered directory entry.
///
/// Produced by directory enumeration and consumed when the entry is
/// dispatched to a hasher; nothing retains it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// Whether the entry is a regular file (symlinks are never followed)
    pub is_regular: bool,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new regular-file entry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            is_regular: true,
            size,
        }
    }

    /// Build an entry from `lstat`-style metadata.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            is_regular: metadata.file_type().is_file(),
            size: metadata.len(),
        }
    }

    /// Whether this entry should be hashed.
    ///
    /// Empty files all share one digest and are never reported; devices,
    /// sockets and symlinks are not content we compare.
    #[must_use]
    pub fn is_hashable(&self) -> bool {
        self.is_regular && self.size > 0
    }
}

/// A fatal traversal failure.
///
/// Anything other than an entry vanishing between listing and inspection
/// aborts the whole scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when reading a directory or entry.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while enumerating.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while enumerating `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// Path the failure refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::Io { path, .. } => path,
        }
    }
}

/// A per-file hashing failure. Never fatal: the file is dropped from the
/// grouping and counted in the scan summary.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before it could be opened.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening or reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// Path of the file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Io { path, .. } => path,
        }
    }
}

/// Whether an I/O error means the entry vanished mid-scan.
#[must_use]
pub fn is_vanished(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Counters shared by every task of a scan.
#[derive(Debug, Default)]
pub struct ScanStats {
    dirs_visited: AtomicU64,
    files_discovered: AtomicU64,
    bytes_discovered: AtomicU64,
    vanished: AtomicU64,
}

impl ScanStats {
    pub fn record_dir(&self) {
        self.dirs_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self, size: u64) {
        self.files_discovered.fetch_add(1, Ordering::Relaxed);
        self.bytes_discovered.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_vanished(&self) {
        self.vanished.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn dirs_visited(&self) -> u64 {
        self.dirs_visited.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn files_discovered(&self) -> u64 {
        self.files_discovered.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_discovered(&self) -> u64 {
        self.bytes_discovered.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn vanished(&self) -> u64 {
        self.vanished.load(Ordering::Relaxed)
    }
}
