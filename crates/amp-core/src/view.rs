//! Device-side array access
//!
//! An [`ArrayView`] is the handle a kernel closure captures. It addresses the
//! array's device buffer directly, independent of the host access type: the
//! device always has full read-write access to its own storage.
//!
//! Indexing outside the extent panics. Inside a kernel that panic becomes an
//! accelerator fault on every buffer the dispatch touched.

use crate::element::Element;
use crate::extent::{Extent, Index, IndexSpace};
use amp_backends::{BufferHandle, DeviceBuffer};
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

/// A buffer a kernel declares it touches
///
/// Dispatch holds every declared buffer's fence until the kernel finishes.
pub trait KernelArgument {
    fn device_buffer(&self) -> &Arc<DeviceBuffer>;
}

/// Typed device view of a [`SharedArray`](crate::SharedArray)
pub struct ArrayView<T, const N: usize> {
    buffer: Arc<DeviceBuffer>,
    space: IndexSpace<N>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element, const N: usize> ArrayView<T, N> {
    pub(crate) fn new(buffer: Arc<DeviceBuffer>, extent: Extent<N>) -> Self {
        Self {
            buffer,
            space: IndexSpace::new(extent),
            _marker: PhantomData,
        }
    }

    pub fn extent(&self) -> Extent<N> {
        self.space.extent()
    }

    pub fn handle(&self) -> BufferHandle {
        self.buffer.handle()
    }

    /// Read the element at `index`
    pub fn get(&self, index: Index<N>) -> T {
        self.load(&index)
    }

    /// Store `value` at `index`
    pub fn set(&self, index: Index<N>, value: T) {
        self.store(&index, value);
    }

    /// Replace the element at `index` with `f(old)`
    ///
    /// Not atomic with respect to another lane updating the same element;
    /// lanes of one dispatch each own their index.
    pub fn update(&self, index: Index<N>, f: impl FnOnce(T) -> T) {
        let next = f(self.load(&index));
        self.store(&index, next);
    }

    fn load(&self, index: &Index<N>) -> T {
        let mut value = T::zeroed();
        if let Err(e) = self.buffer.read_bytes(self.offset(index), bytemuck::bytes_of_mut(&mut value)) {
            panic!("device read at {index:?} failed: {e}");
        }
        value
    }

    fn store(&self, index: &Index<N>, value: T) {
        if let Err(e) = self.buffer.write_bytes(self.offset(index), bytemuck::bytes_of(&value)) {
            panic!("device write at {index:?} failed: {e}");
        }
    }

    fn offset(&self, index: &Index<N>) -> usize {
        match self.space.linearize(index) {
            Some(linear) => linear * size_of::<T>(),
            None => panic!(
                "index {:?} out of bounds for extent {}",
                index.coords(),
                self.space.extent()
            ),
        }
    }
}

impl<T, const N: usize> Clone for ArrayView<T, N> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            space: self.space,
            _marker: PhantomData,
        }
    }
}

impl<T, const N: usize> KernelArgument for ArrayView<T, N> {
    fn device_buffer(&self) -> &Arc<DeviceBuffer> {
        &self.buffer
    }
}

impl<T, const N: usize> fmt::Debug for ArrayView<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayView")
            .field("handle", &self.buffer.handle())
            .field("extent", &self.space.extent())
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}
