//! Completion tracking for asynchronous device work
//!
//! A [`CompletionTracker`] counts submitted-but-unfinished work items and lets
//! host threads block until the count drains. Every device buffer owns one
//! (the per-buffer fence), every dispatch owns one (its completion handle) and
//! every queue owns one (queue-wide idle wait).

use crate::error::{BackendError, Result};
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct TrackerState {
    pending: usize,
    submitted: u64,
    completed: u64,
    fault: Option<String>,
}

/// Counter of outstanding work with a blocking wait
#[derive(Debug, Default)]
pub struct CompletionTracker {
    state: Mutex<TrackerState>,
    drained: Condvar,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one submitted work item
    pub fn begin(&self) {
        let mut state = self.state.lock();
        state.pending += 1;
        state.submitted += 1;
    }

    /// Record one finished work item, waking waiters when none remain
    pub fn finish(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.pending > 0, "finish() without matching begin()");
        state.pending = state.pending.saturating_sub(1);
        state.completed += 1;
        if state.pending == 0 {
            self.drained.notify_all();
        }
    }

    /// Record one work item that died with a fault
    ///
    /// The fault is sticky: every later [`wait`](Self::wait) reports it.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(1);
        if state.fault.is_none() {
            state.fault = Some(message.into());
        }
        self.drained.notify_all();
    }

    /// Block until no work is outstanding
    ///
    /// Returns immediately when nothing is pending. Returns
    /// [`BackendError::AcceleratorFault`] once any tracked item has faulted.
    pub fn wait(&self) -> Result<()> {
        let mut state = self.state.lock();
        while state.pending > 0 && state.fault.is_none() {
            self.drained.wait(&mut state);
        }
        match &state.fault {
            Some(message) => Err(BackendError::AcceleratorFault(message.clone())),
            None => Ok(()),
        }
    }

    /// Number of outstanding work items
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Fault message, if any item failed
    pub fn fault(&self) -> Option<String> {
        self.state.lock().fault.clone()
    }

    /// (submitted, completed) totals since creation
    pub fn totals(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.submitted, state.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_without_work_is_noop() {
        let tracker = CompletionTracker::new();
        assert!(tracker.wait().is_ok());
        assert!(tracker.wait().is_ok());
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_wait_blocks_until_finish() {
        let tracker = Arc::new(CompletionTracker::new());
        tracker.begin();
        tracker.begin();
        assert_eq!(tracker.pending(), 2);

        let worker = {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                tracker.finish();
                tracker.finish();
            })
        };

        tracker.wait().unwrap();
        assert!(tracker.is_idle());
        assert_eq!(tracker.totals(), (2, 2));
        worker.join().unwrap();
    }

    #[test]
    fn test_fault_is_sticky() {
        let tracker = CompletionTracker::new();
        tracker.begin();
        tracker.fail("kernel panicked");

        assert_eq!(
            tracker.wait(),
            Err(BackendError::AcceleratorFault("kernel panicked".to_string()))
        );
        assert!(tracker.wait().unwrap_err().is_fault());
        assert_eq!(tracker.fault().as_deref(), Some("kernel panicked"));
    }
}
