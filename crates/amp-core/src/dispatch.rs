//! Kernel dispatch
//!
//! A kernel is a function of an [`Index`] that runs once for every index of
//! an extent. Buffers the kernel reads or writes are declared up front; the
//! dispatch holds their fences until the last invocation returns.
//!
//! `launch` returns after submission. Visitation order and concurrency
//! among indices are unspecified: invocations for different indices run in
//! parallel across the device's worker threads.
//!
//! # Usage
//!
//! ```rust
//! use amp_core::{AccessType, Accelerator, Dispatch, Extent, SharedArray};
//!
//! # fn main() -> amp_core::Result<()> {
//! let acc = Accelerator::new_cpu()?;
//! let view = acc.default_view();
//! let extent = Extent::new([8, 8])?;
//! let arr = SharedArray::<u32, 2>::new(extent, &view, AccessType::Read)?;
//!
//! let dev = arr.device_view();
//! let done = Dispatch::new(&view, extent)
//!     .label("iota")
//!     .touching(&arr)
//!     .launch(move |idx| dev.set(idx, (idx[0] * 8 + idx[1]) as u32))?;
//! done.wait();
//!
//! assert_eq!(arr.to_vec()?, (0..64).collect::<Vec<u32>>());
//! # Ok(())
//! # }
//! ```

use crate::accelerator::AcceleratorView;
use crate::barrier::{self, Completion};
use crate::error::{Error, Result};
use crate::extent::{Extent, Index, IndexSpace};
use crate::view::KernelArgument;
use amp_backends::{BackendError, DeviceBuffer, Job};
use rayon::prelude::*;
use std::sync::Arc;

/// Builder for one kernel launch
pub struct Dispatch<const N: usize> {
    view: AcceleratorView,
    space: IndexSpace<N>,
    label: String,
    touches: Vec<Arc<DeviceBuffer>>,
}

impl<const N: usize> Dispatch<N> {
    pub fn new(view: &AcceleratorView, extent: Extent<N>) -> Self {
        Self {
            view: view.clone(),
            space: IndexSpace::new(extent),
            label: "kernel".to_string(),
            touches: Vec::new(),
        }
    }

    /// Name used in logs and fault messages
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Declare a buffer the kernel accesses
    pub fn touching(mut self, argument: &dyn KernelArgument) -> Self {
        self.touches.push(Arc::clone(argument.device_buffer()));
        self
    }

    /// Submit the kernel
    ///
    /// # Errors
    ///
    /// [`Error::DispatchFailed`] if the queue refuses the submission.
    ///
    /// # Panics
    ///
    /// If an earlier dispatch on this view faulted.
    #[tracing::instrument(skip_all, fields(kernel = %self.label, extent = %self.space.extent()))]
    pub fn launch<F>(self, kernel: F) -> Result<Completion>
    where
        F: Fn(Index<N>) + Send + Sync + 'static,
    {
        let space = self.space;
        let elements = space.size();

        let job = self
            .touches
            .into_iter()
            .fold(
                Job::new(self.label, elements, move || {
                    (0..elements)
                        .into_par_iter()
                        .for_each(|linear| kernel(space.index_at(linear)));
                }),
                Job::touching,
            );

        match self.view.submit(job) {
            Ok(tracker) => Ok(Completion::new(tracker)),
            Err(BackendError::AcceleratorFault(message)) => barrier::fault(&message),
            Err(e) => Err(Error::DispatchFailed(e.to_string())),
        }
    }
}

/// Run `kernel` once for every index of `extent` on `view`
///
/// `arguments` lists the arrays the kernel touches. Returns once the work is
/// queued; host access to any listed array waits for it.
pub fn parallel_for_each<const N: usize, F>(
    view: &AcceleratorView,
    extent: Extent<N>,
    arguments: &[&dyn KernelArgument],
    kernel: F,
) -> Result<Completion>
where
    F: Fn(Index<N>) + Send + Sync + 'static,
{
    arguments
        .iter()
        .fold(Dispatch::new(view, extent), |dispatch, &argument| dispatch.touching(argument))
        .launch(kernel)
}
