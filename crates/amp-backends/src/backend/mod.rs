//! Device trait, buffers and supporting types

mod buffer;
mod completion;
mod traits;
mod types;

pub use buffer::{DeviceBuffer, HostMapping};
pub use completion::CompletionTracker;
pub use traits::{Device, ExecutionQueue, Job};
pub use types::{BufferHandle, DeviceCapabilities, StorageMode};
