//! Device and execution-queue traits
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Device trait                  │
//! │  - description() / capabilities()             │
//! │  - allocate_buffer(size, StorageMode)         │
//! │  - create_queue()                             │
//! └──────────────────────┬───────────────────────┘
//!                        │ creates
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │             ExecutionQueue trait              │
//! │  - submit(Job) -> completion tracker          │
//! │  - wait_idle()                                │
//! └──────────────────────────────────────────────┘
//! ```

use super::buffer::DeviceBuffer;
use super::completion::CompletionTracker;
use super::types::{DeviceCapabilities, StorageMode};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// A unit of device work
///
/// `body` runs once on the queue's worker, inside the device's thread pool,
/// and is expected to fan out over its index space itself. `touches` lists
/// every buffer the body may access: their trackers are held pending from
/// submission until the body returns.
pub struct Job {
    pub label: String,
    pub elements: usize,
    pub touches: Vec<Arc<DeviceBuffer>>,
    pub body: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    pub fn new(label: impl Into<String>, elements: usize, body: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label: label.into(),
            elements,
            touches: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Declare a buffer the body accesses
    pub fn touching(mut self, buffer: Arc<DeviceBuffer>) -> Self {
        if !self.touches.iter().any(|b| Arc::ptr_eq(b, &buffer)) {
            self.touches.push(buffer);
        }
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .field("elements", &self.elements)
            .field("touches", &self.touches.iter().map(|b| b.handle()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// An accelerator the runtime can allocate on and submit to
pub trait Device: Send + Sync {
    /// Human-readable device name
    fn description(&self) -> &str;

    /// Capabilities consumed by storage negotiation and dispatch validation
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Allocate a zero-filled buffer of `size` bytes
    ///
    /// # Errors
    ///
    /// - [`InvalidAllocation`](crate::BackendError::InvalidAllocation) for `size == 0`
    /// - [`OutOfDeviceMemory`](crate::BackendError::OutOfDeviceMemory) when the budget is exhausted
    /// - [`HostSharedMemoryUnsupported`](crate::BackendError::HostSharedMemoryUnsupported) for
    ///   `StorageMode::HostShared` on a device without zero-copy support
    fn allocate_buffer(&self, size: usize, mode: StorageMode) -> Result<Arc<DeviceBuffer>>;

    /// Create a new in-order submission queue
    fn create_queue(&self) -> Result<Arc<dyn ExecutionQueue>>;

    /// Bytes currently allocated on the device
    fn allocated_bytes(&self) -> usize;
}

/// In-order submission queue
pub trait ExecutionQueue: Send + Sync {
    /// Enqueue a job and return its completion tracker
    ///
    /// Returns once the job is queued, not when it has run. Submission-time
    /// failures (empty or oversized index space, closed queue) are returned
    /// here; failures inside the body surface as faults on the trackers.
    fn submit(&self, job: Job) -> Result<Arc<CompletionTracker>>;

    /// Block until every job submitted so far has finished
    fn wait_idle(&self) -> Result<()>;

    /// Jobs submitted but not yet finished
    fn pending(&self) -> usize;
}
