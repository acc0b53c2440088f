//! # amp-core - Zero-Copy Shared Arrays
//!
//! Typed N-dimensional arrays that live in accelerator memory and, when the
//! device supports it, are mapped straight into the host address space.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  SharedArray<T, N>  ── read / write / increment_all      │
//! │         │                    ▲                           │
//! │         │ device_view()      │ fence (implicit)          │
//! │         ▼                    │                           │
//! │  ArrayView<T, N> ──▶ Dispatch / parallel_for_each        │
//! └─────────┬───────────────────────────────────────────────┘
//!           │ AccessModeNegotiator (storage at construction)
//!           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  amp-backends: Device, DeviceBuffer, ExecutionQueue      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Extent / IndexSpace**: rectangular iteration domains
//! - **AccessModeNegotiator**: CPU access type → device-only or host-shared storage
//! - **SharedArray**: host access gated by the negotiated access type
//! - **Dispatch**: asynchronous per-index kernels on an accelerator view
//! - **fence / Completion**: host-side waits on outstanding device work
//!
//! ## Failure model
//!
//! Construction and submission errors are returned as [`Error`]. A kernel
//! that panics is an accelerator fault: the buffers it touched are poisoned
//! and the next fence on them panics.

pub mod access;
pub mod accelerator;
pub mod array;
pub mod barrier;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod extent;
pub mod verify;
pub mod view;

pub use access::{AccessModeNegotiator, AccessType, ResolvedStorage, StorageMode};
pub use accelerator::{Accelerator, AcceleratorView};
pub use array::SharedArray;
pub use barrier::{fence, Completion};
pub use dispatch::{parallel_for_each, Dispatch};
pub use element::Element;
pub use error::{Error, Result};
pub use extent::{Extent, Index, IndexSpace, Indices};
pub use verify::matches_expected;
pub use view::{ArrayView, KernelArgument};

pub use amp_backends::{DeviceCapabilities, DeviceConfig};
