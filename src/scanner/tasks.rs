//! Completion tracking for dynamically spawned scan tasks.
//!
//! A [`TaskGroup`] counts outstanding tasks spawned into a rayon scope.
//! The count is raised before a task is handed to the pool and lowered by a
//! guard once the task body returns (or unwinds), so it can only reach zero
//! after every task, at any recursion depth, has finished. Children register
//! through the same group as their parent, which is what lets the root's
//! wait cover the whole tree.
//!
//! The blocking wait itself is the end of the rayon scope: [`TaskGroup::run`]
//! does not return until the scope, and therefore the counter, has drained.
//!
//! ```
//! use dupfind::scanner::TaskGroup;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
//! let group = TaskGroup::new();
//! let leaves = AtomicUsize::new(0);
//!
//! group.run(&pool, |tasks, scope| {
//!     for _ in 0..3 {
//!         tasks.spawn(scope, |tasks, scope| {
//!             tasks.spawn(scope, |_, _| {
//!                 leaves.fetch_add(1, Ordering::Relaxed);
//!             });
//!         });
//!     }
//! });
//!
//! assert_eq!(leaves.load(Ordering::Relaxed), 3);
//! assert_eq!(group.outstanding(), 0);
//! assert_eq!(group.spawned(), 6);
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use rayon::{Scope, ThreadPool};

/// Reference-counted join point for a tree of spawned tasks.
#[derive(Debug, Default)]
pub struct TaskGroup {
    outstanding: AtomicUsize,
    peak: AtomicUsize,
    spawned: AtomicU64,
}

impl TaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `root` inside a scope on `pool`, returning once every task it
    /// transitively spawned through this group has completed.
    pub fn run<'scope, F>(&'scope self, pool: &ThreadPool, root: F)
    where
        F: FnOnce(&'scope TaskGroup, &Scope<'scope>) + Send,
    {
        pool.scope(|scope| root(self, scope));
        debug_assert_eq!(self.outstanding(), 0, "scope drained with tasks outstanding");
    }

    /// Register a task and hand it to the pool.
    ///
    /// The increment happens before the task is queued; the decrement after
    /// its body has run, even if it panics. A task may call `spawn` again
    /// on the group and scope it receives, at any depth, and the group will
    /// not drain until those children finish too.
    ///
    /// Spawning never blocks, so it is safe to call while holding a
    /// [`Permit`](crate::scanner::Permit).
    ///
    /// # Arguments
    ///
    /// * `scope` - The scope handed to [`TaskGroup::run`] or to the parent task.
    /// * `task` - Work to run on the pool. It receives this group and the
    ///   scope so it can register children of its own.
    pub fn spawn<'scope, F>(&'scope self, scope: &Scope<'scope>, task: F)
    where
        F: FnOnce(&'scope TaskGroup, &Scope<'scope>) + Send + 'scope,
    {
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::Relaxed);
        self.spawned.fetch_add(1, Ordering::Relaxed);

        scope.spawn(move |scope| {
            let _done = Completion { group: self };
            task(self, scope);
        });
    }

    /// Tasks registered but not yet finished.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously outstanding tasks.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Total tasks ever registered.
    #[must_use]
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

struct Completion<'a> {
    group: &'a TaskGroup,
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.group.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
