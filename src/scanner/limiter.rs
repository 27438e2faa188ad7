//! Bounded token pool for IO-bound operations.
//!
//! The number of spawned tasks is unbounded (one per file), but the number
//! of files open at once must not be. [`Limiter`] holds `capacity` tokens in
//! a bounded channel: [`Limiter::acquire`] blocks until it can take one and
//! hands back a [`Permit`] that returns the token when dropped, on every
//! exit path including early returns and unwinding.
//!
//! ```
//! use dupfind::scanner::Limiter;
//!
//! let limiter = Limiter::new(2);
//! {
//!     let _a = limiter.acquire();
//!     let _b = limiter.acquire();
//!     assert_eq!(limiter.in_use(), 2);
//! }
//! assert_eq!(limiter.in_use(), 0);
//! assert_eq!(limiter.peak(), 2);
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};

/// Fixed-capacity counting semaphore.
#[derive(Debug)]
pub struct Limiter {
    capacity: usize,
    release: Sender<()>,
    take: Receiver<()>,
    in_use: AtomicUsize,
    peak: AtomicUsize,
    granted: AtomicU64,
}

impl Limiter {
    /// Create a pool with `capacity` tokens (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (release, take) = bounded(capacity);
        for _ in 0..capacity {
            // Cannot fail: the channel has room for exactly `capacity` tokens.
            let _ = release.try_send(());
        }
        Self {
            capacity,
            release,
            take,
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            granted: AtomicU64::new(0),
        }
    }

    /// Default capacity: a small multiple of the available processors.
    #[must_use]
    pub fn default_capacity() -> usize {
        3 * std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    /// Block until a token is free, then reserve it.
    ///
    /// Call this immediately before opening a file or directory and keep
    /// the returned permit alive only for as long as the handle is open.
    /// Never wait on another task, a channel or a second permit while
    /// holding one: every holder must be able to finish with the
    /// filesystem alone, which is what keeps the scan deadlock-free for
    /// any capacity.
    ///
    /// # Returns
    ///
    /// A [`Permit`] that gives the token back when dropped, including on
    /// early return and unwinding.
    pub fn acquire(&self) -> Permit<'_> {
        self.take
            .recv()
            .expect("limiter owns a sender, the token channel cannot disconnect");
        self.on_grant()
    }

    fn on_grant(&self) -> Permit<'_> {
        let now = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.granted.fetch_add(1, Ordering::Relaxed);
        Permit { limiter: self }
    }

    fn release(&self) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        // Never blocks: at most `capacity` tokens exist.
        let _ = self.release.try_send(());
    }

    /// Total number of tokens.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    /// Highest number of tokens ever held at once.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of successful acquisitions.
    #[must_use]
    pub fn granted(&self) -> u64 {
        self.granted.load(Ordering::Relaxed)
    }
}

/// A held token. Dropping it returns the token to the pool.
#[derive(Debug)]
#[must_use = "the token is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    limiter: &'a Limiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
