//! Memory manager for the CPU device
//!
//! Hands out [`DeviceBuffer`]s against a fixed byte budget. Buffers are
//! reference counted and return their bytes to the budget when the last
//! owner drops them.

use crate::backend::{BufferHandle, DeviceBuffer, StorageMode};
use crate::error::{BackendError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct MemoryManager {
    /// Next buffer handle ID
    next_buffer_id: u64,

    /// Budget in bytes
    capacity: usize,

    /// Bytes held by live buffers (shared with every buffer for release on drop)
    in_use: Arc<AtomicUsize>,
}

impl MemoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            next_buffer_id: 1,
            capacity,
            in_use: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Allocate a zero-filled buffer, charging `size` bytes to the budget
    pub fn allocate_buffer(&mut self, size: usize, mode: StorageMode) -> Result<Arc<DeviceBuffer>> {
        if size == 0 {
            return Err(BackendError::InvalidAllocation("zero-sized buffer".into()));
        }

        self.reserve(size)?;

        let handle = BufferHandle::new(self.next_buffer_id);
        self.next_buffer_id += 1;

        Ok(Arc::new(DeviceBuffer::new(handle, size, mode, Some(Arc::clone(&self.in_use)))))
    }

    fn reserve(&self, size: usize) -> Result<()> {
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            let available = self.capacity.saturating_sub(current);
            if size > available {
                return Err(BackendError::OutOfDeviceMemory {
                    requested: size,
                    available,
                });
            }
            match self
                .in_use
                .compare_exchange_weak(current, current + size, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_charged_and_released() {
        let mut memory = MemoryManager::new(1024);
        let a = memory.allocate_buffer(256, StorageMode::HostShared).unwrap();
        let b = memory.allocate_buffer(256, StorageMode::DeviceOnly).unwrap();
        assert_eq!(memory.allocated_bytes(), 512);
        assert_ne!(a.handle(), b.handle());

        drop(a);
        assert_eq!(memory.allocated_bytes(), 256);
        drop(b);
        assert_eq!(memory.allocated_bytes(), 0);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut memory = MemoryManager::new(100);
        let _held = memory.allocate_buffer(64, StorageMode::HostShared).unwrap();
        let err = memory.allocate_buffer(64, StorageMode::HostShared).unwrap_err();
        assert_eq!(
            err,
            BackendError::OutOfDeviceMemory {
                requested: 64,
                available: 36
            }
        );
    }

    #[test]
    fn test_released_bytes_are_reusable() {
        let mut memory = MemoryManager::new(100);
        let first = memory.allocate_buffer(80, StorageMode::DeviceOnly).unwrap();
        assert!(memory.allocate_buffer(80, StorageMode::DeviceOnly).is_err());

        drop(first);
        let second = memory.allocate_buffer(80, StorageMode::DeviceOnly).unwrap();
        assert_eq!(second.handle().id(), 2);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut memory = MemoryManager::new(100);
        assert!(matches!(
            memory.allocate_buffer(0, StorageMode::DeviceOnly),
            Err(BackendError::InvalidAllocation(_))
        ));
    }
}
