//! Accelerator selection by element type

use crate::error::{HarnessError, Result};
use amp_core::{Accelerator, Element};
use std::any::{type_name, TypeId};

/// Check that `accelerator` can run kernels over `T`
///
/// 64-bit floats need double-precision support; every other element type
/// runs on any accelerator.
pub fn check_device_for<T: Element>(accelerator: &Accelerator) -> Result<()> {
    if TypeId::of::<T>() == TypeId::of::<f64>() && !accelerator.supports_double_precision() {
        return Err(HarnessError::NoCompatibleDevice {
            element: type_name::<T>(),
            reason: format!("{} lacks double precision", accelerator.description()),
        });
    }
    Ok(())
}

/// The environment-configured accelerator, if it supports `T`
pub fn require_device_for<T: Element>() -> Result<Accelerator> {
    let accelerator = Accelerator::from_env()?;
    check_device_for::<T>(&accelerator)?;
    tracing::info!(
        device = accelerator.description(),
        element = type_name::<T>(),
        zero_copy = accelerator.supports_cpu_shared_memory(),
        "device_selected"
    );
    Ok(accelerator)
}
