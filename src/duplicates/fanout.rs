//! Fan-out strategy: one task per directory and one per file.
//!
//! Every directory visit and every file hash runs as its own task on a
//! rayon pool. Directory tasks spawn their children as entries are listed,
//! so recursion is by spawning, and all tasks register with one
//! [`TaskGroup`] so the coordinator can wait for the whole tree.
//!
//! Task count is unbounded but IO is not: each task holds a [`Limiter`]
//! permit only while it has a directory or file open. Results are sent to
//! the aggregator after the permit is released, and spawning never blocks,
//! so a token holder never waits on anything that could need a token.
//!
//! The first enumeration failure aborts the scan. Tasks already queued see
//! the abort flag and return without touching the filesystem.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::Sender;
use rayon::Scope;

use super::aggregator::{Aggregator, HashOutcome};
use super::finder::{FinderConfig, FinderError, Phase, StrategyRun};
use crate::scanner::{Discovered, FileEntry, Hasher, Limiter, ScanError, TaskGroup, Walker};

struct Shared<'a> {
    walker: &'a Walker,
    hasher: &'a Hasher,
    limiter: Limiter,
    output: Sender<HashOutcome>,
    fatal: Mutex<Option<ScanError>>,
    aborted: AtomicBool,
}

impl Shared<'_> {
    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Keep the first fatal error; later ones are only logged.
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
        .thread_name(|i| format!("dupfind-scan-{i}"))
        .build()?;
    let aggregator = Aggregator::spawn().map_err(FinderError::Spawn)?;

    let state = Shared {
        walker,
        hasher,
        limiter: Limiter::new(config.io_limit),
        output: aggregator.sender(),
        fatal: Mutex::new(None),
        aborted: AtomicBool::new(false),
    };
    let group = TaskGroup::new();

    Phase::Traversing.enter(root);
    group.run(&pool, |tasks, scope| {
        let state = &state;
        let root = root.to_path_buf();
        tasks.spawn(scope, move |tasks, scope| walk_dir(state, tasks, scope, root));
    });

    Phase::Draining.enter(root);
    log::debug!(
        "{} tasks spawned, at most {} outstanding, io peak {}/{} over {} permits",
        group.spawned(),
        group.peak(),
        state.limiter.peak(),
        state.limiter.capacity(),
        state.limiter.granted()
    );
    let Shared {
        limiter,
        output,
        fatal,
        ..
    } = state;
    drop(output);

    Phase::Aggregating.enter(root);
    let aggregate = aggregator.finish()?;

    if let Some(err) = fatal.into_inner().unwrap_or_else(PoisonError::into_inner) {
        return Err(err.into());
    }
    Ok(StrategyRun::new(aggregate, limiter.peak(), group.spawned()))
}

fn walk_dir<'s>(state: &'s Shared<'s>, tasks: &'s TaskGroup, scope: &Scope<'s>, dir: PathBuf) {
    if state.is_aborted() {
        return;
    }

    let listed = {
        let _permit = state.limiter.acquire();
        state.walker.visit(&dir, |item| match item {
            Discovered::Directory(sub) => {
                tasks.spawn(scope, move |tasks, scope| walk_dir(state, tasks, scope, sub));
            }
            Discovered::File(file) => {
                tasks.spawn(scope, move |_, _| hash_file(state, file));
            }
        })
    };

    if let Err(err) = listed {
        log::error!("Aborting scan: {err}");
        state.abort(err);
    }
}

fn hash_file(state: &Shared<'_>, file: FileEntry) {
    if state.is_aborted() {
        return;
    }

    let outcome = {
        let _permit = state.limiter.acquire();
        HashOutcome::compute(state.hasher, file)
    };

    // Only fails if the aggregator died, which finish() reports.
    let _ = state.output.send(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::finder::Strategy;
    use std::fs;
    use tempfile::TempDir;

    fn config(io_limit: usize, threads: usize) -> FinderConfig {
        FinderConfig::default()
            .with_strategy(Strategy::FanOut)
            .with_io_limit(io_limit)
            .with_threads(threads)
    }

    fn nested_tree(depth: usize, per_dir: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        let mut current = dir.path().to_path_buf();
        for level in 0..depth {
            for i in 0..per_dir {
                fs::write(current.join(format!("f{i}")), format!("content {i}")).unwrap();
            }
            current = current.join(format!("level{level}"));
            fs::create_dir(&current).unwrap();
        }
        dir
    }

    #[test]
    fn test_fanout_groups_across_levels() {
        let dir = nested_tree(5, 3);
        let run = run(dir.path(), &config(4, 4), &Walker::new(), &Hasher::new()).unwrap();

        // Each of the 3 bodies appears once per level.
        assert_eq!(run.groups.len(), 3);
        assert_eq!(run.groups.total_paths(), 15);
        assert!(run.groups.iter().all(|(_, paths)| paths.len() == 5));
        // 6 directory tasks (root and the empty innermost level included) + 15 file tasks
        assert_eq!(run.tasks_spawned, 21);
    }

    #[test]
    fn test_fanout_single_token_single_thread_completes() {
        let dir = nested_tree(4, 4);
        let run = run(dir.path(), &config(1, 1), &Walker::new(), &Hasher::new()).unwrap();

        assert_eq!(run.groups.total_paths(), 16);
        assert_eq!(run.peak_io, 1);
    }

    #[test]
    fn test_fanout_peak_bounded_by_io_limit() {
        let dir = TempDir::new().unwrap();
        let body = vec![b'x'; 64 * 1024];
        for i in 0..10 {
            fs::write(dir.path().join(format!("f{i}")), &body).unwrap();
        }

        let run = run(dir.path(), &config(2, 8), &Walker::new(), &Hasher::new()).unwrap();
        assert!(run.peak_io >= 1);
        assert!(run.peak_io <= 2);
        let digest = *blake3::hash(&body).as_bytes();
        assert_eq!(run.groups.get(&digest).unwrap().len(), 10);
    }

    #[test]
    #[cfg(unix)]
    fn test_fanout_unreadable_directory_aborts() {
        use std::os::unix::fs::PermissionsExt;

        let dir = nested_tree(2, 2);
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = run(dir.path(), &config(2, 2), &Walker::new(), &Hasher::new());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(FinderError::Traversal(ScanError::PermissionDenied(path))) => {
                assert_eq!(path, locked);
            }
            other => panic!("expected traversal error, got {other:?}"),
        }
    }
}
