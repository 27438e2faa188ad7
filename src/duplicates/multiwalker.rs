//! Multi-walker strategy: a walker per directory feeding fixed hashers.
//!
//! Directory visits run as tasks on a rayon pool, one per directory, so
//! sibling subtrees are listed in parallel. Instead of spawning a task per
//! file, walkers push hashable files into one bounded queue drained by
//! `workers` named hashing threads, the same threads the pipeline strategy
//! uses.
//!
//! Completion is two-stage. The [`TaskGroup`] wait covers every walker;
//! only then is the queue closed, and the hashing threads finish once they
//! have drained it. The aggregator's input closes after the last hasher
//! has exited.
//!
//! A walker holds a [`Limiter`] permit while its directory is open and
//! releases it before queueing the files it found, so a walker blocked on
//! a full queue never starves the hashers of tokens.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{bounded, Sender};
use rayon::Scope;

use super::aggregator::Aggregator;
use super::finder::{FinderConfig, FinderError, Phase, StrategyRun};
use super::pipeline::spawn_hashers;
use crate::scanner::{Discovered, FileEntry, Hasher, Limiter, ScanError, TaskGroup, Walker};

/// Files buffered between the walkers and the hashers.
const QUEUE_CAPACITY: usize = 256;

struct Walkers<'a> {
    walker: &'a Walker,
    limiter: &'a Limiter,
    paths: Sender<FileEntry>,
    fatal: Mutex<Option<ScanError>>,
    aborted: &'a AtomicBool,
}

impl Walkers<'_> {
    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn abort(&self, err: ScanError) {
        self.aborted.store(true, Ordering::Release);
        let mut fatal = self.fatal.lock().unwrap_or_else(PoisonError::into_inner);
        if fatal.is_none() {
            *fatal = Some(err);
        } else {
            log::debug!("Further traversal error after abort: {err}");
        }
    }
}

pub(crate) fn run(
    root: &Path,
    config: &FinderConfig,
    walker: &Walker,
    hasher: &Hasher,
) -> Result<StrategyRun, FinderError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("dupfind-walk-{i}"))
        .build()?;
    let limiter = Limiter::new(config.io_limit);
    let aborted = AtomicBool::new(false);
    let group = TaskGroup::new();
    let aggregator = Aggregator::spawn().map_err(FinderError::Spawn)?;
    let (path_tx, path_rx) = bounded::<FileEntry>(QUEUE_CAPACITY);

    Phase::Traversing.enter(root);
    let walked = thread::scope(|s| -> Result<(), FinderError> {
        // Owns the queue's only sender; dropping it closes the queue.
        let state = Walkers {
            walker,
            limiter: &limiter,
            paths: path_tx,
            fatal: Mutex::new(None),
            aborted: &aborted,
        };

        spawn_hashers(s, config.workers, &path_rx, &aggregator, &limiter, hasher, &aborted)?;
        drop(path_rx);

        group.run(&pool, |tasks, scope| {
            let state = &state;
            let root = root.to_path_buf();
            tasks.spawn(scope, move |tasks, scope| walk_dir(state, tasks, scope, root));
        });

        Phase::Draining.enter(root);
        log::debug!(
            "{} walkers spawned, at most {} outstanding",
            group.spawned(),
            group.peak()
        );
        let Walkers { paths, fatal, .. } = state;
        drop(paths);

        match fatal.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    });

    Phase::Aggregating.enter(root);
    log::debug!(
        "io peak {}/{} over {} permits",
        limiter.peak(),
        limiter.capacity(),
        limiter.granted()
    );
    let aggregate = aggregator.finish()?;
    walked?;

    Ok(StrategyRun::new(aggregate, limiter.peak(), group.spawned()))
}

fn walk_dir<'s>(state: &'s Walkers<'s>, tasks: &'s TaskGroup, scope: &Scope<'s>, dir: PathBuf) {
    if state.is_aborted() {
        return;
    }

    let mut files = Vec::new();
    let listed = {
        let _permit = state.limiter.acquire();
        state.walker.visit(&dir, |item| match item {
            Discovered::Directory(sub) => {
                tasks.spawn(scope, move |tasks, scope| walk_dir(state, tasks, scope, sub));
            }
            Discovered::File(file) => files.push(file),
        })
    };

    if let Err(err) = listed {
        log::error!("Aborting scan: {err}");
        state.abort(err);
        return;
    }

    for file in files {
        // A closed queue means every hasher has gone; nothing left to feed.
        if state.is_aborted() || state.paths.send(file).is_err() {
            break;
        }
    }
}
