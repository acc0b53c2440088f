//! Error types for amp-core operations

use crate::access::AccessType;
use amp_backends::BackendError;

/// Result type for amp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced synchronously by array construction, host access and dispatch submission
///
/// Failures inside a running kernel are not represented here: they poison the
/// buffers the kernel touched and the next fence on those buffers panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Non-positive or otherwise unusable extent
    #[error("Invalid extent: {0}")]
    InvalidExtent(String),

    /// The device could not provide backing storage
    #[error("Allocation failed: {bytes} bytes ({reason})")]
    AllocationFailed { bytes: usize, reason: String },

    /// Host operation outside the array's negotiated CPU access type
    #[error("Access denied: {operation} is not permitted with CPU access type {access}")]
    AccessDenied { operation: &'static str, access: AccessType },

    /// The execution queue refused the submission
    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    /// Host index outside the array's extent
    #[error("Index {index:?} out of bounds for extent {extent:?}")]
    IndexOutOfBounds { index: Vec<usize>, extent: Vec<usize> },

    /// Host slice length does not match the array
    #[error("Size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Host access requested on a device without zero-copy memory
    #[error("Accelerator does not support CPU shared memory; host access requires it")]
    HostSharedMemoryUnsupported,

    /// Other device-layer error
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Error {
    pub(crate) fn allocation(bytes: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            bytes,
            reason: reason.into(),
        }
    }
}
