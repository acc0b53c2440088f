//! Accelerators and their execution views
//!
//! An [`Accelerator`] is a device handle. An [`AcceleratorView`] is an
//! in-order submission queue on that device; dispatches on one view execute
//! in submission order while dispatches on different views may overlap.
//! Every accelerator carries a default view shared by all of its clones.

use crate::barrier;
use crate::error::Result;
use amp_backends::{
    BackendError, CompletionTracker, CpuDevice, Device, DeviceCapabilities, DeviceConfig, ExecutionQueue, Job,
};
use std::fmt;
use std::sync::Arc;

/// Handle to one accelerator device
#[derive(Clone)]
pub struct Accelerator {
    device: Arc<dyn Device>,
    default_queue: Arc<dyn ExecutionQueue>,
}

impl Accelerator {
    /// Wrap an existing device, creating its default view
    pub fn from_device(device: Arc<dyn Device>) -> Result<Self> {
        let default_queue = device.create_queue()?;
        Ok(Self { device, default_queue })
    }

    /// CPU accelerator with the default configuration
    pub fn new_cpu() -> Result<Self> {
        Self::with_config(DeviceConfig::default())
    }

    /// CPU accelerator with an explicit configuration
    pub fn with_config(config: DeviceConfig) -> Result<Self> {
        Self::from_device(Arc::new(CpuDevice::with_config(config)?))
    }

    /// CPU accelerator configured from `AMP_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(DeviceConfig::from_env()?)
    }

    pub fn description(&self) -> &str {
        self.device.description()
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        self.device.capabilities()
    }

    /// Whether host and device can share one allocation (zero-copy)
    pub fn supports_cpu_shared_memory(&self) -> bool {
        self.capabilities().supports_host_shared_memory
    }

    pub fn supports_double_precision(&self) -> bool {
        self.capabilities().supports_double_precision
    }

    /// Bytes currently allocated on the device
    pub fn allocated_bytes(&self) -> usize {
        self.device.allocated_bytes()
    }

    /// The view shared by every handle to this accelerator
    pub fn default_view(&self) -> AcceleratorView {
        self.view_on(Arc::clone(&self.default_queue))
    }

    /// A new, independent in-order view
    pub fn create_view(&self) -> Result<AcceleratorView> {
        Ok(self.view_on(self.device.create_queue()?))
    }

    fn view_on(&self, queue: Arc<dyn ExecutionQueue>) -> AcceleratorView {
        AcceleratorView {
            device: Arc::clone(&self.device),
            queue,
            default_queue: Arc::clone(&self.default_queue),
        }
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }
}

impl fmt::Debug for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accelerator")
            .field("description", &self.description())
            .field("capabilities", self.capabilities())
            .finish()
    }
}

/// In-order execution queue on an accelerator
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct AcceleratorView {
    device: Arc<dyn Device>,
    queue: Arc<dyn ExecutionQueue>,
    /// The owning accelerator's default queue
    default_queue: Arc<dyn ExecutionQueue>,
}

impl AcceleratorView {
    /// Accelerator this view submits to
    ///
    /// The returned handle shares this accelerator's default view, also when
    /// called on a view made by [`Accelerator::create_view`].
    pub fn accelerator(&self) -> Accelerator {
        Accelerator {
            device: Arc::clone(&self.device),
            default_queue: Arc::clone(&self.default_queue),
        }
    }

    /// Whether this is its accelerator's default view
    pub fn is_default(&self) -> bool {
        Arc::ptr_eq(&self.queue, &self.default_queue)
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        self.device.capabilities()
    }

    /// Block until every dispatch submitted to this view has finished
    ///
    /// # Panics
    ///
    /// If any of those dispatches faulted.
    pub fn wait(&self) {
        barrier::settle(self.queue.wait_idle());
    }

    /// Dispatches submitted but not yet finished
    pub fn pending_dispatches(&self) -> usize {
        self.queue.pending()
    }

    pub(crate) fn submit(&self, job: Job) -> std::result::Result<Arc<CompletionTracker>, BackendError> {
        self.queue.submit(job)
    }
}

impl PartialEq for AcceleratorView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue)
    }
}

impl Eq for AcceleratorView {}

impl fmt::Debug for AcceleratorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceleratorView")
            .field("device", &self.device.description())
            .field("pending", &self.queue.pending())
            .finish()
    }
}
