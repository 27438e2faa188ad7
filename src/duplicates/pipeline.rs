//! Pipeline strategy: one walker feeding a fixed set of hashing threads.
//!
//! The calling thread walks the tree and pushes every hashable file into a
//! bounded queue. `workers` named threads pull from it, hash, and send the
//! outcome to the aggregator. Hashing is still gated by a [`Limiter`] so
//! the reported IO peak means the same thing as in the fan-out strategy.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use super::aggregator::{Aggregator, HashOutcome};
use super::finder::{FinderConfig, FinderError, Phase, StrategyRun};
use crate::scanner::{FileEntry, Hasher, Limiter, Walker};

/// Files buffered between the walker and the workers.
const QUEUE_CAPACITY: usize = 256;

pub(crate) fn run(
    root: &Path,
    config: &FinderConfig,
    walker: &Walker,
    hasher: &Hasher,
) -> Result<StrategyRun, FinderError> {
    let limiter = Limiter::new(config.io_limit);
    let aborted = AtomicBool::new(false);
    let aggregator = Aggregator::spawn().map_err(FinderError::Spawn)?;
    let (path_tx, path_rx) = bounded::<FileEntry>(QUEUE_CAPACITY);

    Phase::Traversing.enter(root);
    let walked = thread::scope(|s| -> Result<(), FinderError> {
        // Owned here so every exit from this closure closes the queue.
        let path_tx = path_tx;

        spawn_hashers(s, config.workers, &path_rx, &aggregator, &limiter, hasher, &aborted)?;
        drop(path_rx);

        for entry in walker.walk(root) {
            match entry {
                Ok(file) => {
                    if path_tx.send(file).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::error!("Aborting scan: {err}");
                    aborted.store(true, Ordering::Release);
                    return Err(err.into());
                }
            }
        }
        Phase::Draining.enter(root);
        Ok(())
    });

    Phase::Aggregating.enter(root);
    let aggregate = aggregator.finish()?;
    walked?;

    Ok(StrategyRun::new(aggregate, limiter.peak(), 0))
}

/// Start `workers` named threads that hash files from `paths` into the
/// aggregator until the queue closes.
///
/// Each hash is gated by `limiter`. Once `aborted` is set the threads keep
/// draining the queue without touching the files, so producers never block
/// on a queue nobody reads.
pub(super) fn spawn_hashers<'scope, 'env>(
    s: &'scope thread::Scope<'scope, 'env>,
    workers: usize,
    paths: &Receiver<FileEntry>,
    aggregator: &Aggregator,
    limiter: &'env Limiter,
    hasher: &'env Hasher,
    aborted: &'env AtomicBool,
) -> Result<(), FinderError> {
    for i in 0..workers {
        let paths = paths.clone();
        let output = aggregator.sender();
        thread::Builder::new()
            .name(format!("dupfind-hash-{i}"))
            .spawn_scoped(s, move || {
                for file in paths {
                    if aborted.load(Ordering::Acquire) {
                        continue;
                    }
                    let outcome = {
                        let _permit = limiter.acquire();
                        HashOutcome::compute(hasher, file)
                    };
                    if output.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .map_err(FinderError::Spawn)?;
    }
    Ok(())
}
