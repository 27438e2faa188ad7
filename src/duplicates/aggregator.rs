//! Single-consumer fan-in of hash results.
//!
//! Every hashing task sends its outcome down one channel; a dedicated
//! thread owns the [`DuplicateGroups`] and is the only code that touches it.
//! The thread stops when the last sender is dropped, which the coordinator
//! arranges only after every producer has finished, and hands the
//! finished grouping back through [`Aggregator::finish`].
//!
//! ```
//! use dupfind::duplicates::{Aggregator, HashOutcome, PathDigestPair};
//! use std::path::PathBuf;
//!
//! let aggregator = Aggregator::spawn().unwrap();
//! let input = aggregator.sender();
//! let digest = *blake3::hash(b"hello").as_bytes();
//! input.send(HashOutcome::Hashed(PathDigestPair::new(digest, PathBuf::from("/a"), 5))).unwrap();
//! input.send(HashOutcome::Hashed(PathDigestPair::new(digest, PathBuf::from("/b"), 5))).unwrap();
//! drop(input);
//!
//! let aggregate = aggregator.finish().unwrap();
//! assert_eq!(aggregate.groups.get(&digest).unwrap().len(), 2);
//! ```

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use super::finder::FinderError;
use super::groups::{DuplicateGroups, PathDigestPair};
use crate::scanner::{FileEntry, HashError, Hasher};

/// Capacity of the aggregator's input channel.
pub const INPUT_CAPACITY: usize = 1024;

/// What one hashing task produced.
#[derive(Debug)]
pub enum HashOutcome {
    /// The file was hashed.
    Hashed(PathDigestPair),
    /// The file could not be opened or read and is left out of the grouping.
    Skipped(HashError),
}

impl HashOutcome {
    /// Hash `file`, turning a read failure into a skip.
    #[must_use]
    pub fn compute(hasher: &Hasher, file: FileEntry) -> Self {
        match hasher.full_hash(&file.path) {
            Ok(digest) => Self::Hashed(PathDigestPair::new(digest, file.path, file.size)),
            Err(err) => {
                log::debug!("Skipping unreadable file: {err}");
                Self::Skipped(err)
            }
        }
    }
}

/// Everything the aggregator collected.
#[derive(Debug, Default)]
pub struct Aggregate {
    /// Digest → paths
    pub groups: DuplicateGroups,
    /// Files dropped because they could not be hashed
    pub skipped: Vec<HashError>,
    /// Bytes of content hashed successfully
    pub bytes_hashed: u64,
}

impl Aggregate {
    /// Fold one outcome in.
    pub fn record(&mut self, outcome: HashOutcome) {
        match outcome {
            HashOutcome::Hashed(pair) => {
                self.bytes_hashed += pair.size;
                self.groups.insert(pair);
            }
            HashOutcome::Skipped(err) => self.skipped.push(err),
        }
    }

    /// Number of files hashed successfully.
    #[must_use]
    pub fn files_hashed(&self) -> usize {
        self.groups.total_paths()
    }
}

/// Handle to the running aggregator thread.
#[derive(Debug)]
pub struct Aggregator {
    input: Sender<HashOutcome>,
    handle: JoinHandle<Aggregate>,
}

impl Aggregator {
    /// Start the aggregator thread.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to create the thread.
    pub fn spawn() -> io::Result<Self> {
        let (input, output) = bounded(INPUT_CAPACITY);
        let handle = thread::Builder::new()
            .name("dupfind-aggregator".to_string())
            .spawn(move || drain(output))?;
        Ok(Self { input, handle })
    }

    /// A producer end of the input channel.
    #[must_use]
    pub fn sender(&self) -> Sender<HashOutcome> {
        self.input.clone()
    }

    /// Close the input and wait for the final grouping.
    ///
    /// Any sender handed out by [`Aggregator::sender`] must already be
    /// dropped, otherwise this blocks until it is.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Aggregator`] if the thread panicked.
    pub fn finish(self) -> Result<Aggregate, FinderError> {
        drop(self.input);
        self.handle.join().map_err(|_| FinderError::Aggregator)
    }
}

fn drain(output: Receiver<HashOutcome>) -> Aggregate {
    let mut aggregate = Aggregate::default();
    for outcome in output {
        aggregate.record(outcome);
    }
    log::debug!(
        "Aggregator drained: {} digests, {} files, {} skipped",
        aggregate.groups.len(),
        aggregate.files_hashed(),
        aggregate.skipped.len()
    );
    aggregate
}
