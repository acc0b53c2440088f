//! Device buffers and their host mappings
//!
//! A [`DeviceBuffer`] is one physical allocation. Device code (kernel bodies
//! running on the queue) may always read and write it. Host code reaches the
//! bytes only through a [`HostMapping`], which exists only for
//! [`StorageMode::HostShared`] buffers, so a device-only allocation can never
//! be touched from the host.

use super::completion::CompletionTracker;
use super::types::{BufferHandle, StorageMode};
use crate::error::{BackendError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// One device allocation
///
/// Bytes are individually atomic, so any number of kernel lanes may read and
/// write disjoint elements without a buffer-wide lock. Loads and stores are
/// `Relaxed`; ordering between device work and host access comes from the
/// [`CompletionTracker`] handoff (queue worker `finish`, host `wait`).
/// Two lanes writing the same element concurrently may interleave bytes.
pub struct DeviceBuffer {
    handle: BufferHandle,
    mode: StorageMode,
    bytes: Box<[AtomicU8]>,
    completion: CompletionTracker,
    /// Device-wide byte counter released on drop
    accounting: Option<Arc<AtomicUsize>>,
}

impl DeviceBuffer {
    /// Allocate zero-filled storage
    ///
    /// `accounting` is the owning device's in-use counter, already charged
    /// with `size` by the caller.
    pub fn new(handle: BufferHandle, size: usize, mode: StorageMode, accounting: Option<Arc<AtomicUsize>>) -> Self {
        let bytes = (0..size).map(|_| AtomicU8::new(0)).collect::<Vec<_>>().into_boxed_slice();
        Self {
            handle,
            mode,
            bytes,
            completion: CompletionTracker::new(),
            accounting,
        }
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Outstanding-work tracker for dispatches touching this buffer
    pub fn completion(&self) -> &CompletionTracker {
        &self.completion
    }

    /// Map the buffer into the host address space
    ///
    /// # Errors
    ///
    /// [`BackendError::NotHostVisible`] for device-only storage.
    pub fn map_host(&self) -> Result<HostMapping<'_>> {
        if !self.mode.is_host_visible() {
            return Err(BackendError::NotHostVisible(self.handle.id()));
        }
        Ok(HostMapping { buffer: self })
    }

    // ============================================================================================
    // Device-side access
    // ============================================================================================

    /// Copy `dst.len()` bytes starting at `offset` out of the buffer
    pub fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let range = checked_range(offset, dst.len(), self.bytes.len())?;
        for (out, byte) in dst.iter_mut().zip(&self.bytes[range]) {
            *out = byte.load(Ordering::Relaxed);
        }
        Ok(())
    }

    /// Copy `src` into the buffer starting at `offset`
    pub fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<()> {
        let range = checked_range(offset, src.len(), self.bytes.len())?;
        for (byte, &value) in self.bytes[range].iter().zip(src) {
            byte.store(value, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if let Some(accounting) = &self.accounting {
            accounting.fetch_sub(self.bytes.len(), Ordering::AcqRel);
        }
        tracing::trace!(handle = %self.handle, mode = %self.mode, "device_buffer_released");
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("handle", &self.handle)
            .field("mode", &self.mode)
            .field("len", &self.len())
            .field("pending", &self.completion.pending())
            .finish()
    }
}

/// Host view of a [`StorageMode::HostShared`] buffer
///
/// Reads and writes go straight to the shared allocation; there is no
/// staging copy. Callers are responsible for fencing outstanding device
/// work first.
#[derive(Clone, Copy)]
pub struct HostMapping<'a> {
    buffer: &'a DeviceBuffer,
}

impl<'a> HostMapping<'a> {
    pub fn handle(&self) -> BufferHandle {
        self.buffer.handle
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn read(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.buffer.read_bytes(offset, dst)
    }

    pub fn write(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.buffer.write_bytes(offset, src)
    }
}

fn checked_range(offset: usize, size: usize, buffer_size: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(size) {
        Some(end) if end <= buffer_size => Ok(offset..end),
        _ => Err(BackendError::BufferOutOfBounds {
            offset,
            size,
            buffer_size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(mode: StorageMode) -> DeviceBuffer {
        DeviceBuffer::new(BufferHandle::new(1), 16, mode, None)
    }

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buf = buffer(StorageMode::HostShared);
        assert_eq!(buf.len(), 16);
        let mut out = [0xffu8; 16];
        buf.read_bytes(0, &mut out).unwrap();
        assert_eq!(out, [0u8; 16]);
    }

    #[test]
    fn test_device_read_write() {
        let buf = buffer(StorageMode::DeviceOnly);
        buf.write_bytes(4, b"abcd").unwrap();

        let mut out = [0u8; 4];
        buf.read_bytes(4, &mut out).unwrap();
        assert_eq!(&out, b"abcd");
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let buf = buffer(StorageMode::HostShared);
        let err = buf.write_bytes(14, b"abcd").unwrap_err();
        assert_eq!(
            err,
            BackendError::BufferOutOfBounds {
                offset: 14,
                size: 4,
                buffer_size: 16
            }
        );
        assert!(buf.read_bytes(usize::MAX, &mut [0u8; 2]).is_err());
    }

    #[test]
    fn test_device_only_cannot_be_mapped() {
        let buf = buffer(StorageMode::DeviceOnly);
        assert_eq!(buf.map_host().err(), Some(BackendError::NotHostVisible(1)));
    }

    #[test]
    fn test_host_mapping_shares_storage() {
        let buf = buffer(StorageMode::HostShared);
        let mapping = buf.map_host().unwrap();
        mapping.write(0, &[7, 7]).unwrap();

        // Device side sees the host write without any copy.
        let mut out = [0u8; 2];
        buf.read_bytes(0, &mut out).unwrap();
        assert_eq!(out, [7, 7]);
    }

    #[test]
    fn test_concurrent_disjoint_writes() {
        let buf = Arc::new(DeviceBuffer::new(BufferHandle::new(4), 4096, StorageMode::DeviceOnly, None));
        let writers: Vec<_> = (0..4u8)
            .map(|lane| {
                let buf = Arc::clone(&buf);
                std::thread::spawn(move || {
                    for i in 0..1024 {
                        buf.write_bytes(lane as usize * 1024 + i, &[lane + 1]).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let mut out = vec![0u8; 4096];
        buf.read_bytes(0, &mut out).unwrap();
        for (lane, chunk) in out.chunks(1024).enumerate() {
            assert!(chunk.iter().all(|&b| b == lane as u8 + 1));
        }
    }

    #[test]
    fn test_drop_releases_accounting() {
        let counter = Arc::new(AtomicUsize::new(16));
        let buf = DeviceBuffer::new(BufferHandle::new(3), 16, StorageMode::HostShared, Some(Arc::clone(&counter)));
        drop(buf);
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }
}
