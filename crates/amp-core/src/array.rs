//! Shared arrays
//!
//! A [`SharedArray`] owns device storage for an N-dimensional extent of `T`.
//! Its CPU access type is negotiated at construction: host-accessible arrays
//! live in host-shared (zero-copy) memory, so host reads and writes touch the
//! same bytes kernels do, with no staging copies.
//!
//! Every host operation fences first. A kernel's writes are therefore always
//! visible to the next host access, and host mutation (which takes
//! `&mut self`) never overlaps a dispatch submitted through this array.
//!
//! # Example
//!
//! ```rust
//! use amp_core::{parallel_for_each, AccessType, Accelerator, Extent, SharedArray};
//!
//! # fn main() -> amp_core::Result<()> {
//! let acc = Accelerator::new_cpu()?;
//! let view = acc.default_view();
//! let extent = Extent::new([4, 4])?;
//!
//! let mut arr = SharedArray::<i32, 2>::new(extent, &view, AccessType::ReadWrite)?;
//! arr.fill(100)?;
//!
//! let dev = arr.device_view();
//! parallel_for_each(&view, extent, &[&arr], move |idx| dev.update(idx, |v| v + 1))?;
//!
//! arr.increment_all(1)?;
//! assert!(arr.to_vec()?.iter().all(|&v| v == 102));
//! # Ok(())
//! # }
//! ```

use crate::access::{AccessModeNegotiator, AccessType, ResolvedStorage, StorageMode};
use crate::accelerator::AcceleratorView;
use crate::barrier;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::extent::{Extent, Index, IndexSpace};
use crate::view::{ArrayView, KernelArgument};
use amp_backends::{BufferHandle, DeviceBuffer, HostMapping};
use amp_tracing::performance::record_transfer;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Add;
use std::sync::Arc;
use std::time::Instant;

/// N-dimensional array in accelerator memory, optionally shared with the host
pub struct SharedArray<T, const N: usize> {
    space: IndexSpace<N>,
    storage: ResolvedStorage,
    buffer: Arc<DeviceBuffer>,
    view: AcceleratorView,
    _marker: PhantomData<T>,
}

impl<T: Element, const N: usize> SharedArray<T, N> {
    /// Allocate a zero-initialized array bound to `view`
    ///
    /// # Errors
    ///
    /// - [`Error::HostSharedMemoryUnsupported`] if `access` needs host access
    ///   and the device has no zero-copy memory
    /// - [`Error::AllocationFailed`] if the device cannot provide the storage
    #[tracing::instrument(skip_all, fields(
        extent = %extent,
        access = %access,
        element = std::any::type_name::<T>()
    ))]
    pub fn new(extent: Extent<N>, view: &AcceleratorView, access: AccessType) -> Result<Self> {
        let bytes = extent
            .size()
            .checked_mul(size_of::<T>())
            .ok_or_else(|| Error::allocation(usize::MAX, format!("{extent} elements overflow the address space")))?;

        let (storage, buffer) = AccessModeNegotiator::bind(view.device(), access, bytes)?;

        Ok(Self {
            space: IndexSpace::new(extent),
            storage,
            buffer,
            view: view.clone(),
            _marker: PhantomData,
        })
    }

    // ============================================================================================
    // Host element access
    // ============================================================================================

    /// Read one element after fencing outstanding device work
    pub fn read(&self, index: Index<N>) -> Result<T> {
        let mapping = self.host_mapping("read", AccessType::allows_read)?;
        let offset = self.offset(&index)?;

        let mut value = T::zeroed();
        mapping.read(offset, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Write one element after fencing outstanding device work
    pub fn write(&mut self, index: Index<N>, value: T) -> Result<()> {
        let mapping = self.host_mapping("write", AccessType::allows_write)?;
        let offset = self.offset(&index)?;
        mapping.write(offset, bytemuck::bytes_of(&value))?;
        Ok(())
    }

    /// Add `delta` to every element from the host
    ///
    /// Equivalent to `write(i, read(i) + delta)` for every index, so the
    /// array must be readable and writable.
    pub fn increment_all(&mut self, delta: T) -> Result<()>
    where
        T: Add<Output = T>,
    {
        let mapping = self.host_mapping("increment_all", |a| a.allows_read() && a.allows_write())?;
        let _span = amp_tracing::perf_span!("increment_all", elements = self.len());

        let mut value = T::zeroed();
        for offset in (0..self.size_bytes()).step_by(size_of::<T>()) {
            mapping.read(offset, bytemuck::bytes_of_mut(&mut value))?;
            mapping.write(offset, bytemuck::bytes_of(&(value + delta)))?;
        }
        Ok(())
    }

    // ============================================================================================
    // Host bulk transfer
    // ============================================================================================

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) -> Result<()> {
        let mapping = self.host_mapping("fill", AccessType::allows_write)?;
        let start = Instant::now();

        let pattern = bytemuck::bytes_of(&value);
        for offset in (0..self.size_bytes()).step_by(pattern.len()) {
            mapping.write(offset, pattern)?;
        }

        record_transfer(self.size_bytes(), "host_fill", start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Overwrite the array with `src` in row-major order
    #[tracing::instrument(skip(self, src), fields(
        handle = %self.buffer.handle(),
        elements = src.len(),
        bytes = std::mem::size_of_val(src)
    ))]
    pub fn copy_from_slice(&mut self, src: &[T]) -> Result<()> {
        let mapping = self.host_mapping("copy_from_slice", AccessType::allows_write)?;
        if src.len() != self.len() {
            return Err(Error::SizeMismatch {
                expected: self.len(),
                actual: src.len(),
            });
        }

        let start = Instant::now();
        mapping.write(0, bytemuck::cast_slice(src))?;

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            duration_us = duration_us,
            bytes = std::mem::size_of_val(src),
            direction = "host_write",
            "shared_array_copy_from_slice"
        );
        Ok(())
    }

    /// Copy the array out in row-major order
    #[tracing::instrument(skip(self), fields(
        handle = %self.buffer.handle(),
        elements = self.len()
    ))]
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mapping = self.host_mapping("to_vec", AccessType::allows_read)?;
        let start = Instant::now();

        let mut out = vec![T::zeroed(); self.len()];
        mapping.read(0, bytemuck::cast_slice_mut(&mut out))?;

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            duration_us = duration_us,
            bytes = self.size_bytes(),
            direction = "host_read",
            "shared_array_to_vec"
        );
        Ok(out)
    }

    // ============================================================================================
    // Device side and metadata
    // ============================================================================================

    /// Device handle for kernels; available for every access type
    pub fn device_view(&self) -> ArrayView<T, N> {
        ArrayView::new(Arc::clone(&self.buffer), self.space.extent())
    }

    pub fn buffer_handle(&self) -> BufferHandle {
        self.buffer.handle()
    }

    /// Negotiated host access type
    pub fn cpu_access_type(&self) -> AccessType {
        self.storage.access
    }

    pub fn storage_kind(&self) -> StorageMode {
        self.storage.mode
    }

    pub fn extent(&self) -> Extent<N> {
        self.space.extent()
    }

    pub fn index_space(&self) -> &IndexSpace<N> {
        &self.space
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.space.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.len() * size_of::<T>()
    }

    /// View the array was constructed on
    pub fn accelerator_view(&self) -> &AcceleratorView {
        &self.view
    }

    /// Block until every dispatch touching this array has completed
    pub fn fence(&self) {
        barrier::fence(self);
    }

    pub(crate) fn device_buffer(&self) -> &Arc<DeviceBuffer> {
        &self.buffer
    }

    /// Check `allowed` against the access type, fence, then map for host access
    fn host_mapping(&self, operation: &'static str, allowed: impl Fn(AccessType) -> bool) -> Result<HostMapping<'_>> {
        let access = self.storage.access;
        if !allowed(access) {
            return Err(Error::AccessDenied { operation, access });
        }
        self.fence();
        Ok(self.buffer.map_host()?)
    }

    fn offset(&self, index: &Index<N>) -> Result<usize> {
        self.space
            .linearize(index)
            .map(|linear| linear * size_of::<T>())
            .ok_or_else(|| Error::IndexOutOfBounds {
                index: index.coords().to_vec(),
                extent: self.space.extent().dims().to_vec(),
            })
    }
}

impl<T, const N: usize> KernelArgument for SharedArray<T, N> {
    fn device_buffer(&self) -> &Arc<DeviceBuffer> {
        &self.buffer
    }
}

impl<T, const N: usize> fmt::Debug for SharedArray<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedArray")
            .field("handle", &self.buffer.handle())
            .field("extent", &self.space.extent())
            .field("access", &self.storage.access)
            .field("storage", &self.storage.mode)
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}
