//! # Critical Section Module
//!
//! Process-wide mutual exclusion for work that is not safe to run concurrently.
//!
//! ## Overview
//!
//! A [`CriticalSection`] is a token naming one exclusion domain. Any number can be
//! created; clones share the same domain. Ownership is per thread and re-entrant:
//! the owning thread may acquire again, and must release as many times.
//!
//! When the host runs in critical-only mode the dispatcher holds one global token
//! for the whole of every dispatch call. Handlers see it through
//! [`HandlerUnit::critical_section`](crate::handler::HandlerUnit::critical_section)
//! and may drop it around long blocking work:
//!
//! ```rust
//! use nsdispatch::critical::CriticalSection;
//!
//! let crit = CriticalSection::new();
//! let mut guard = crit.lock();
//! assert!(crit.is_held_by_current_thread());
//!
//! guard.release_early();
//! // ... long-running work that does not need exclusivity ...
//! guard.reacquire();
//!
//! drop(guard);
//! assert!(!crit.is_held());
//! ```
//!
//! ## Release semantics
//!
//! Releasing a token the current thread does not own is a logged no-op, so a
//! handler that gave the global token back and never re-acquired it cannot
//! corrupt the dispatcher's own release.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
}

#[derive(Debug)]
struct Inner {
    id: u64,
    state: Mutex<Ownership>,
    released: Condvar,
}

/// Token for one mutual-exclusion domain.
#[derive(Debug, Clone)]
pub struct CriticalSection {
    inner: Arc<Inner>,
}

impl Default for CriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl CriticalSection {
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed);
        debug!(token = id, "critical-section token allocated");
        Self {
            inner: Arc::new(Inner {
                id,
                state: Mutex::new(Ownership::default()),
                released: Condvar::new(),
            }),
        }
    }

    /// Process-unique token number, used in log events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Block until the current thread owns the section.
    pub fn acquire(&self) {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();
        if state.owner == Some(me) {
            state.depth += 1;
            return;
        }
        while state.owner.is_some() {
            self.inner.released.wait(&mut state);
        }
        state.owner = Some(me);
        state.depth = 1;
        debug!(token = self.inner.id, "entered critical section");
    }

    /// Take the section only if it is free (or already ours).
    pub fn try_acquire(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();
        match state.owner {
            Some(owner) if owner == me => {
                state.depth += 1;
                true
            }
            Some(_) => false,
            None => {
                state.owner = Some(me);
                state.depth = 1;
                debug!(token = self.inner.id, "entered critical section");
                true
            }
        }
    }

    /// Give up one level of ownership.
    ///
    /// Returns `false`, and changes nothing, when the current thread does not own
    /// the section.
    pub fn release(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();
        if state.owner != Some(me) {
            warn!(
                token = self.inner.id,
                held = state.owner.is_some(),
                "release of critical section not owned by this thread ignored"
            );
            return false;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            debug!(token = self.inner.id, "exited critical section");
            self.inner.released.notify_one();
        }
        true
    }

    /// Acquire and return a guard that releases on drop.
    #[must_use]
    pub fn lock(&self) -> CriticalGuard<'_> {
        self.acquire();
        CriticalGuard {
            section: self,
            held: true,
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.state.lock().owner.is_some()
    }

    #[must_use]
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.state.lock().owner == Some(thread::current().id())
    }

    /// Whether two tokens name the same domain.
    #[must_use]
    pub fn same_domain(&self, other: &CriticalSection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Scoped ownership of a [`CriticalSection`].
///
/// Releases on every exit path, including unwinding.
#[derive(Debug)]
pub struct CriticalGuard<'a> {
    section: &'a CriticalSection,
    held: bool,
}

impl CriticalGuard<'_> {
    /// Release before the end of scope, for long operations that do not need
    /// exclusivity. No-op if already released.
    pub fn release_early(&mut self) {
        if self.held {
            self.section.release();
            self.held = false;
        }
    }

    /// Take the section back after [`release_early`](Self::release_early).
    pub fn reacquire(&mut self) {
        if !self.held {
            self.section.acquire();
            self.held = true;
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for CriticalGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            self.section.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrant_on_owner_thread() {
        let crit = CriticalSection::new();
        crit.acquire();
        crit.acquire();
        assert!(crit.release());
        assert!(crit.is_held_by_current_thread());
        assert!(crit.release());
        assert!(!crit.is_held());
    }

    #[test]
    fn test_release_when_not_held_is_noop() {
        let crit = CriticalSection::new();
        assert!(!crit.release());
        assert!(!crit.is_held());
    }

    #[test]
    fn test_clones_share_domain() {
        let a = CriticalSection::new();
        let b = a.clone();
        assert!(a.same_domain(&b));
        assert!(!a.same_domain(&CriticalSection::new()));
        assert_eq!(a.id(), b.id());
    }
}
