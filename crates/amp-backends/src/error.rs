//! Error types for device operations

/// Result type for device operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors reported by devices, buffers and execution queues
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Buffer access out of bounds
    #[error("buffer access out of bounds: offset {offset} + size {size} > buffer size {buffer_size}")]
    BufferOutOfBounds {
        offset: usize,
        size: usize,
        buffer_size: usize,
    },

    /// Zero-sized or otherwise unrepresentable allocation request
    #[error("invalid allocation request: {0}")]
    InvalidAllocation(String),

    /// Device memory budget exhausted
    #[error("out of device memory: requested {requested} bytes, available {available} bytes")]
    OutOfDeviceMemory { requested: usize, available: usize },

    /// Host-shared storage requested on a device that cannot map memory into the host
    #[error("device does not support host-shared (zero-copy) memory")]
    HostSharedMemoryUnsupported,

    /// Host mapping requested for a device-only buffer
    #[error("buffer {0} is device-only and cannot be mapped into host memory")]
    NotHostVisible(u64),

    /// Submission refused by the execution queue
    #[error("dispatch rejected: {0}")]
    DispatchRejected(String),

    /// The queue worker is gone
    #[error("execution queue is closed")]
    QueueClosed,

    /// A kernel failed while executing; memory it touched is unspecified
    #[error("accelerator fault: {0}")]
    AcceleratorFault(String),

    /// Invalid device configuration
    #[error("invalid device configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Create a dispatch rejection
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::DispatchRejected(msg.into())
    }

    /// True for the non-recoverable execution-time failure class
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::AcceleratorFault(_))
    }
}
