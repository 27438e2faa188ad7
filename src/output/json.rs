//! JSON report for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "strategy": "fanout",
//!     "directories": 12,
//!     "files_discovered": 100,
//!     "bytes_discovered": 1049600,
//!     "files_hashed": 99,
//!     "bytes_hashed": 1048576,
//!     "skipped_files": 1,
//!     "skipped": ["Permission denied: /path/to/secret"],
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "io_limit": 24,
//!     "peak_io": 24,
//!     "scan_duration_ms": 1234
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary, Strategy};

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of every member
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub strategy: Strategy,
    pub directories: u64,
    pub files_discovered: u64,
    /// Total size of the files discovered
    pub bytes_discovered: u64,
    pub files_hashed: usize,
    pub bytes_hashed: u64,
    /// Files left out because they could not be read
    pub skipped_files: usize,
    /// One message per skipped file
    pub skipped: Vec<String>,
    pub duplicate_groups: usize,
    /// Duplicate files excluding one original per group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    pub io_limit: usize,
    /// Most IO operations in flight at once
    pub peak_io: usize,
    pub scan_duration_ms: u64,
}

impl From<&ScanSummary> for JsonSummary {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            strategy: summary.strategy,
            directories: summary.directories,
            files_discovered: summary.files_discovered,
            bytes_discovered: summary.bytes_discovered,
            files_hashed: summary.files_hashed,
            bytes_hashed: summary.bytes_hashed,
            skipped_files: summary.skipped_files(),
            skipped: summary.skipped.iter().map(ToString::to_string).collect(),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            io_limit: summary.io_limit,
            peak_io: summary.peak_io,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub duplicates: Vec<JsonDuplicateGroup>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the report from the finder's results.
    ///
    /// ```
    /// use dupfind::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupfind::output::json::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     [0u8; 32],
    ///     1024,
    ///     vec![PathBuf::from("/file1.txt"), PathBuf::from("/file2.txt")],
    /// )];
    /// let output = JsonOutput::new(&groups, &ScanSummary::default());
    /// assert_eq!(output.duplicates[0].files.len(), 2);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from(summary),
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the pretty-printed report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
