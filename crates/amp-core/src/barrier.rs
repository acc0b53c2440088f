//! Host/device synchronization
//!
//! [`fence`] is the only point where the host's program order meets the
//! device's asynchronous execution: it blocks until every dispatch that
//! touches an array has finished. [`Completion`] waits on one dispatch.
//!
//! Kernel faults are not recoverable. Observing one through any wait here
//! panics with an `accelerator fault` message.

use crate::array::SharedArray;
use crate::element::Element;
use crate::error::Result;
use amp_backends::{BackendError, CompletionTracker, DeviceBuffer};
use amp_tracing::perf_event;
use std::sync::Arc;
use std::time::Instant;

/// Block until all dispatches touching `array` have completed
///
/// A no-op when nothing is outstanding, so repeated fences are harmless.
///
/// # Panics
///
/// If a dispatch touching `array` faulted.
pub fn fence<T: Element, const N: usize>(array: &SharedArray<T, N>) {
    fence_buffer(array.device_buffer());
}

pub(crate) fn fence_buffer(buffer: &DeviceBuffer) {
    let tracker = buffer.completion();
    let pending = tracker.pending();
    if pending == 0 && tracker.fault().is_none() {
        return;
    }

    let start = Instant::now();
    settle(tracker.wait());
    perf_event!(
        "fence_wait",
        handle = buffer.handle().id(),
        pending = pending,
        waited_us = start.elapsed().as_micros() as u64
    );
}

/// Turn a device wait result into either success or an accelerator-fault panic
pub(crate) fn settle(result: std::result::Result<(), BackendError>) {
    match result {
        Ok(()) => {}
        Err(BackendError::AcceleratorFault(message)) => fault(&message),
        Err(other) => fault(&format!("unexpected wait failure: {other}")),
    }
}

pub(crate) fn fault(message: &str) -> ! {
    tracing::error!(%message, "terminating on accelerator fault");
    panic!("accelerator fault: {message}")
}

/// Completion handle for one dispatch
#[derive(Debug, Clone)]
pub struct Completion {
    tracker: Arc<CompletionTracker>,
}

impl Completion {
    pub(crate) fn new(tracker: Arc<CompletionTracker>) -> Self {
        Self { tracker }
    }

    /// Block until the dispatch has run every index
    ///
    /// # Panics
    ///
    /// If the dispatch faulted.
    pub fn wait(&self) {
        settle(self.tracker.wait());
    }

    /// True once the dispatch has finished, successfully or not
    pub fn is_complete(&self) -> bool {
        self.tracker.is_idle()
    }

    /// True if the dispatch faulted
    pub fn is_faulted(&self) -> bool {
        self.tracker.fault().is_some()
    }

    /// Wait and report success without panicking on a fault
    ///
    /// Intended for harnesses that must log a fault before terminating.
    pub fn try_wait(&self) -> Result<()> {
        self.tracker.wait().map_err(Into::into)
    }
}
