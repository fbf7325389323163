// SPDX-License-Identifier: MPL-2.0

//! Background execution tokens
//!
//! Recording completion callbacks can arrive after the app leaves the
//! foreground; a token keeps the process alive long enough to finish writing
//! and saving the file. Hosts without backgrounding simply return `None` from
//! [`BackgroundExecutor::begin`] and recording proceeds without protection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Opaque identifier for an active background-execution grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub u64);

/// Host background-execution service
pub trait BackgroundExecutor: Send + 'static {
    /// Request a grant; `None` when the host does not support backgrounding
    fn begin(&self) -> Option<TaskId>;

    /// End a grant. Each token is ended exactly once.
    fn end(&self, task: TaskId);
}

/// Executor for hosts without background execution support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackgrounding;

impl BackgroundExecutor for NoBackgrounding {
    fn begin(&self) -> Option<TaskId> {
        None
    }

    fn end(&self, _task: TaskId) {}
}

/// Counting executor that hands out sequential tokens.
///
/// Pairs of `begin`/`end` can be audited via [`CountingExecutor::active`];
/// useful in tests and on hosts where the grant is only bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct CountingExecutor {
    next: Arc<AtomicU64>,
    active: Arc<AtomicU64>,
}

impl CountingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently outstanding tokens
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Total number of tokens ever issued
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl BackgroundExecutor for CountingExecutor {
    fn begin(&self) -> Option<TaskId> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(task = id, "background task begun");
        Some(TaskId(id))
    }

    fn end(&self, task: TaskId) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!(task = task.0, "background task ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_executor_tracks_active_tokens() {
        let exec = CountingExecutor::new();
        let a = exec.begin().unwrap();
        let b = exec.begin().unwrap();
        assert_ne!(a, b);
        assert_eq!(exec.active(), 2);
        exec.end(a);
        exec.end(b);
        assert_eq!(exec.active(), 0);
        assert_eq!(exec.issued(), 2);
    }

    #[test]
    fn no_backgrounding_returns_none() {
        assert!(NoBackgrounding.begin().is_none());
    }
}
