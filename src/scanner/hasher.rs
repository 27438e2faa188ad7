//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes the digest of one file's complete content. Reads are
//! streamed through a fixed-size buffer so memory stays flat regardless of
//! file size; files above an optional threshold can be memory-mapped instead.
//!
//! Hashing never re-enters the rayon pool: callers hash while holding a
//! limiter token, and a nested pool job could try to take a second one.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::HashError;

/// A BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    mmap_threshold: Option<u64>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer and no memory mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            mmap_threshold: None,
        }
    }

    /// Set the read buffer size (clamped to at least 4 KiB).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(4096);
        self
    }

    /// Memory-map files whose size is at least `threshold` bytes.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: Option<u64>) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Configured buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Size at which files are memory-mapped, if mapping is enabled.
    #[must_use]
    pub fn mmap_threshold(&self) -> Option<u64> {
        self.mmap_threshold
    }

    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        if let Some(threshold) = self.mmap_threshold {
            let len = file
                .metadata()
                .map_err(|e| HashError::from_io(path.to_path_buf(), e))?
                .len();
            if len >= threshold {
                drop(file);
                let mut hasher = blake3::Hasher::new();
                hasher
                    .update_mmap(path)
                    .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
                return Ok(*hasher.finalize().as_bytes());
            }
        }

        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))
    }

    /// Hash everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates any read error.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Hash> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; self.buffer_size];

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}
