//! CPU access types and storage negotiation
//!
//! The negotiator turns a requested [`AccessType`] into a concrete storage
//! strategy for the target device and allocates the backing buffer:
//!
//! ```text
//! requested     zero-copy device        device without zero-copy
//! ─────────     ──────────────────      ────────────────────────
//! None          DeviceOnly              DeviceOnly
//! Read          HostShared (read)       HostSharedMemoryUnsupported
//! Write         HostShared (write)      HostSharedMemoryUnsupported
//! ReadWrite     HostShared (rw)         HostSharedMemoryUnsupported
//! ```
//!
//! There is no staged-copy fallback. Callers that want one must check
//! [`DeviceCapabilities::supports_host_shared_memory`] and choose a
//! different strategy themselves.

use crate::error::{Error, Result};
use amp_backends::{BackendError, Device, DeviceBuffer, DeviceCapabilities};
use std::fmt;
use std::sync::Arc;

pub use amp_backends::StorageMode;

/// What the host may do with an array's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessType {
    /// Device only; every host read or write is denied
    #[default]
    None,
    Read,
    Write,
    ReadWrite,
}

impl AccessType {
    pub const fn allows_read(self) -> bool {
        matches!(self, AccessType::Read | AccessType::ReadWrite)
    }

    pub const fn allows_write(self) -> bool {
        matches!(self, AccessType::Write | AccessType::ReadWrite)
    }

    pub const fn requires_host_access(self) -> bool {
        !matches!(self, AccessType::None)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AccessType::None => "none",
            AccessType::Read => "read",
            AccessType::Write => "write",
            AccessType::ReadWrite => "read_write",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of negotiation: where the buffer lives and what the host may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStorage {
    pub mode: StorageMode,
    pub access: AccessType,
}

/// Resolves requested CPU access against device capabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessModeNegotiator;

impl AccessModeNegotiator {
    /// Decide the storage strategy for `requested` on a device with `capabilities`
    ///
    /// Never downgrades: the resolved access type always equals the requested one.
    pub fn resolve(requested: AccessType, capabilities: &DeviceCapabilities) -> Result<ResolvedStorage> {
        if !requested.requires_host_access() {
            return Ok(ResolvedStorage {
                mode: StorageMode::DeviceOnly,
                access: AccessType::None,
            });
        }
        if !capabilities.supports_host_shared_memory {
            return Err(Error::HostSharedMemoryUnsupported);
        }
        Ok(ResolvedStorage {
            mode: StorageMode::HostShared,
            access: requested,
        })
    }

    /// Resolve and allocate `bytes` of zero-filled backing storage on `device`
    pub fn bind(
        device: &dyn Device,
        requested: AccessType,
        bytes: usize,
    ) -> Result<(ResolvedStorage, Arc<DeviceBuffer>)> {
        let resolved = Self::resolve(requested, device.capabilities())?;

        let buffer = device.allocate_buffer(bytes, resolved.mode).map_err(|e| match e {
            BackendError::HostSharedMemoryUnsupported => Error::HostSharedMemoryUnsupported,
            BackendError::OutOfDeviceMemory { .. } | BackendError::InvalidAllocation(_) => {
                Error::allocation(bytes, e.to_string())
            }
            other => Error::Backend(other),
        })?;

        tracing::debug!(
            requested = %requested,
            storage = %resolved.mode,
            bytes,
            handle = %buffer.handle(),
            "storage_negotiated"
        );

        Ok((resolved, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_backends::{CpuDevice, DeviceConfig};

    const ALL: [AccessType; 4] = [AccessType::None, AccessType::Read, AccessType::Write, AccessType::ReadWrite];

    #[test]
    fn test_access_type_permissions() {
        assert!(!AccessType::None.allows_read() && !AccessType::None.allows_write());
        assert!(AccessType::Read.allows_read() && !AccessType::Read.allows_write());
        assert!(!AccessType::Write.allows_read() && AccessType::Write.allows_write());
        assert!(AccessType::ReadWrite.allows_read() && AccessType::ReadWrite.allows_write());
        assert_eq!(AccessType::default(), AccessType::None);
    }

    #[test]
    fn test_resolve_on_zero_copy_device() {
        let caps = DeviceCapabilities::default();
        for requested in ALL {
            let resolved = AccessModeNegotiator::resolve(requested, &caps).unwrap();
            assert_eq!(resolved.access, requested);
            assert_eq!(resolved.mode.is_host_visible(), requested.requires_host_access());
        }
    }

    #[test]
    fn test_resolve_without_zero_copy() {
        let caps = DeviceCapabilities {
            supports_host_shared_memory: false,
            ..DeviceCapabilities::default()
        };
        assert_eq!(
            AccessModeNegotiator::resolve(AccessType::None, &caps).unwrap().mode,
            StorageMode::DeviceOnly
        );
        for requested in [AccessType::Read, AccessType::Write, AccessType::ReadWrite] {
            assert_eq!(
                AccessModeNegotiator::resolve(requested, &caps),
                Err(Error::HostSharedMemoryUnsupported)
            );
        }
    }

    #[test]
    fn test_bind_reports_allocation_failure() {
        let device = CpuDevice::with_config(DeviceConfig {
            memory_bytes: 64,
            ..DeviceConfig::default()
        })
        .unwrap();

        let (resolved, buffer) = AccessModeNegotiator::bind(&device, AccessType::ReadWrite, 64).unwrap();
        assert_eq!(resolved.mode, StorageMode::HostShared);
        assert_eq!(buffer.len(), 64);

        let err = AccessModeNegotiator::bind(&device, AccessType::None, 8).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { bytes: 8, .. }));
    }
}
