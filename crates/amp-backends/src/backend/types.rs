//! Types for device configuration and handles

use std::fmt;

/// Handle to an allocated device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

impl BufferHandle {
    /// Create a new buffer handle
    pub const fn new(id: u64) -> Self {
        BufferHandle(id)
    }

    /// Get the internal ID
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf{}", self.0)
    }
}

/// Where a buffer lives and who may map it
///
/// ```text
/// DeviceOnly  - device address space only; the host never maps it
/// HostShared  - one physical allocation mapped into host and device
///               (zero-copy, no staging transfers)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMode {
    DeviceOnly,
    HostShared,
}

impl StorageMode {
    /// Whether the host may map this storage
    pub const fn is_host_visible(self) -> bool {
        matches!(self, StorageMode::HostShared)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StorageMode::DeviceOnly => "DeviceOnly",
            StorageMode::HostShared => "HostShared",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities a device reports to the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Host and device can share one physical allocation
    pub supports_host_shared_memory: bool,
    /// Device kernels may operate on 64-bit floats
    pub supports_double_precision: bool,
    /// Total bytes the device can have allocated at once
    pub dedicated_memory_bytes: usize,
    /// Largest index space a single dispatch may cover
    pub max_dispatch_elements: usize,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            supports_host_shared_memory: true,
            supports_double_precision: true,
            dedicated_memory_bytes: 1 << 30,
            max_dispatch_elements: u32::MAX as usize,
        }
    }
}
