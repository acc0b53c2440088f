//! CPU device implementation
//!
//! Reference implementation of the [`Device`] trait. Device memory is host
//! memory behind a budget, so host-shared storage is genuinely zero-copy;
//! device-only storage simply refuses host mapping.
//!
//! # Architecture
//!
//! ```text
//! CpuDevice
//! ├── MemoryManager  - budgeted buffer allocation
//! ├── ThreadPool     - rayon lanes shared by every queue
//! └── CpuQueue       - one in-order worker per created queue
//! ```
//!
//! # Usage
//!
//! ```rust
//! use amp_backends::{CpuDevice, Device, Job, StorageMode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let device = CpuDevice::new()?;
//! let buffer = device.allocate_buffer(16, StorageMode::HostShared)?;
//! let queue = device.create_queue()?;
//!
//! let target = buffer.clone();
//! let job = Job::new("fill", 4, move || {
//!     target.write_bytes(0, &[7u8; 16]).ok();
//! })
//! .touching(buffer.clone());
//! queue.submit(job)?;
//!
//! buffer.completion().wait()?;
//! let mut out = [0u8; 16];
//! buffer.map_host()?.read(0, &mut out)?;
//! assert_eq!(out, [7u8; 16]);
//! # Ok(())
//! # }
//! ```

pub(crate) mod memory;
mod queue;

pub use queue::CpuQueue;

use crate::backend::{Device, DeviceBuffer, DeviceCapabilities, ExecutionQueue, StorageMode};
use crate::config::DeviceConfig;
use crate::error::{BackendError, Result};
use amp_tracing::performance::record_allocation;
use memory::MemoryManager;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// CPU accelerator
///
/// Cloning is cheap and yields a handle to the same device.
#[derive(Clone)]
pub struct CpuDevice {
    config: Arc<DeviceConfig>,
    capabilities: DeviceCapabilities,
    memory: Arc<RwLock<MemoryManager>>,
    pool: Arc<rayon::ThreadPool>,
    next_queue_id: Arc<AtomicU64>,
}

impl CpuDevice {
    /// Create a device with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(DeviceConfig::default())
    }

    /// Create a device from an explicit configuration
    pub fn with_config(config: DeviceConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("amp-cpu-{i}"));
        if config.worker_threads > 0 {
            builder = builder.num_threads(config.worker_threads);
        }
        let pool = builder
            .build()
            .map_err(|e| BackendError::InvalidConfig(format!("failed to build worker pool: {e}")))?;

        tracing::debug!(
            description = %config.description,
            memory_bytes = config.memory_bytes,
            zero_copy = config.supports_host_shared_memory,
            double_precision = config.supports_double_precision,
            threads = pool.current_num_threads(),
            "cpu_device_created"
        );

        Ok(Self {
            capabilities: config.capabilities(),
            memory: Arc::new(RwLock::new(MemoryManager::new(config.memory_bytes))),
            pool: Arc::new(pool),
            next_queue_id: Arc::new(AtomicU64::new(1)),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Number of kernel worker threads
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Device for CpuDevice {
    fn description(&self) -> &str {
        &self.config.description
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn allocate_buffer(&self, size: usize, mode: StorageMode) -> Result<Arc<DeviceBuffer>> {
        if mode == StorageMode::HostShared && !self.capabilities.supports_host_shared_memory {
            return Err(BackendError::HostSharedMemoryUnsupported);
        }

        let start = Instant::now();
        let buffer = self.memory.write().allocate_buffer(size, mode)?;
        record_allocation(size, mode.as_str(), start.elapsed().as_micros() as u64);

        Ok(buffer)
    }

    fn create_queue(&self) -> Result<Arc<dyn ExecutionQueue>> {
        let id = self.next_queue_id.fetch_add(1, Ordering::Relaxed);
        let queue = CpuQueue::new(id, Arc::clone(&self.pool), self.capabilities.max_dispatch_elements)?;
        tracing::trace!(queue = id, "queue_created");
        Ok(Arc::new(queue))
    }

    fn allocated_bytes(&self) -> usize {
        self.memory.read().allocated_bytes()
    }
}
