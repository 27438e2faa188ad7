//! Digest-keyed grouping of hashed files.
//!
//! # Overview
//!
//! [`DuplicateGroups`] maps each content digest to the paths that produced
//! it, in arrival order. It is owned by exactly one writer (the aggregator
//! thread, or the scanning thread in the sequential strategy). Once the scan
//! has drained, [`DuplicateGroups::into_duplicates`] keeps only digests
//! shared by two or more paths.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::{DuplicateGroups, PathDigestPair};
//! use std::path::PathBuf;
//!
//! let same = *blake3::hash(b"hello").as_bytes();
//! let other = *blake3::hash(b"world").as_bytes();
//!
//! let mut groups = DuplicateGroups::new();
//! groups.insert(PathDigestPair::new(same, PathBuf::from("/a"), 5));
//! groups.insert(PathDigestPair::new(same, PathBuf::from("/b"), 5));
//! groups.insert(PathDigestPair::new(other, PathBuf::from("/c"), 5));
//!
//! assert_eq!(groups.len(), 2);
//! let duplicates = groups.into_duplicates();
//! assert_eq!(duplicates.len(), 1);
//! assert_eq!(duplicates[0].paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{hash_to_hex, Hash};

/// A hashed file on its way to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDigestPair {
    /// BLAKE3 digest of the full content
    pub digest: Hash,
    /// Path of the hashed file
    pub path: PathBuf,
    /// Size observed when the file was discovered
    pub size: u64,
}

impl PathDigestPair {
    #[must_use]
    pub fn new(digest: Hash, path: PathBuf, size: u64) -> Self {
        Self { digest, path, size }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    size: u64,
    paths: Vec<PathBuf>,
}

/// Mapping from digest to the paths sharing it.
#[derive(Debug, Clone, Default)]
pub struct DuplicateGroups {
    slots: HashMap<Hash, Slot>,
    paths: usize,
}

impl DuplicateGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `pair.path` to the sequence for its digest, creating it if absent.
    pub fn insert(&mut self, pair: PathDigestPair) {
        self.slots
            .entry(pair.digest)
            .or_insert_with(|| Slot {
                size: pair.size,
                paths: Vec::new(),
            })
            .paths
            .push(pair.path);
        self.paths += 1;
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of paths across all digests.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.paths
    }

    /// Paths recorded for `digest`, in arrival order.
    #[must_use]
    pub fn get(&self, digest: &Hash) -> Option<&[PathBuf]> {
        self.slots.get(digest).map(|slot| slot.paths.as_slice())
    }

    /// Iterate over every digest and its paths.
    pub fn iter(&self) -> impl Iterator<Item = (&Hash, &[PathBuf])> {
        self.slots
            .iter()
            .map(|(hash, slot)| (hash, slot.paths.as_slice()))
    }

    /// Keep the digests shared by two or more paths.
    ///
    /// Groups come back ordered by reclaimable space (largest first), then
    /// by digest, so reports are stable for an unchanged tree. Paths inside
    /// a group keep their arrival order.
    #[must_use]
    pub fn into_duplicates(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .slots
            .into_iter()
            .filter(|(_, slot)| slot.paths.len() > 1)
            .map(|(hash, slot)| DuplicateGroup::new(hash, slot.size, slot.paths))
            .collect();

        groups.sort_by(|a, b| {
            b.wasted_space()
                .cmp(&a.wasted_space())
                .then_with(|| a.hash.cmp(&b.hash))
        });
        groups
    }
}

/// A set of files with identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 digest shared by every member
    #[serde(serialize_with = "serialize_hash")]
    pub hash: Hash,
    /// Size of each member in bytes
    pub size: u64,
    /// Member paths, in the order their digests arrived
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn new(hash: Hash, size: u64, paths: Vec<PathBuf>) -> Self {
        Self { hash, size, paths }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Bytes freed by keeping one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.paths.len().saturating_sub(1)) as u64
    }
}

fn serialize_hash<S: serde::Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(hash))
}
