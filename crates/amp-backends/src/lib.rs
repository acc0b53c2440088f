//! Device layer for the amp accelerator runtime
//!
//! This crate provides:
//! - **Device Trait**: allocation, capabilities and queue creation
//! - **Storage Modes**: device-only vs host-shared (zero-copy) buffers
//! - **Execution Queues**: in-order asynchronous job submission
//! - **Completion Tracking**: per-buffer, per-dispatch and per-queue fences
//! - **CPU Device**: reference implementation backed by rayon
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                amp-core (SharedArray, dispatch)          │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ Device / ExecutionQueue
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │   DeviceBuffer ── CompletionTracker ── HostMapping       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │  CpuDevice  │
//!                └─────────────┘
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;

pub use backend::{
    BufferHandle, CompletionTracker, Device, DeviceBuffer, DeviceCapabilities, ExecutionQueue, HostMapping, Job,
    StorageMode,
};
pub use backends::{CpuDevice, CpuQueue};
pub use config::DeviceConfig;
pub use error::{BackendError, Result};
