//! Host and device helpers shared by the scenarios

use crate::error::Result;
use amp_core::{matches_expected, parallel_for_each, AccessType, Element, SharedArray};
use std::ops::Add;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Log and report whether `array` negotiated `expected`
pub fn verify_cpu_access_type<T: Element, const N: usize>(array: &SharedArray<T, N>, expected: AccessType) -> bool {
    let actual = array.cpu_access_type();
    if actual != expected {
        tracing::error!(%expected, %actual, "cpu access type mismatch");
        return false;
    }
    true
}

/// Write `value` to every element, one host write per index
pub fn write_all<T: Element, const N: usize>(array: &mut SharedArray<T, N>, value: T) -> Result<()> {
    let space = *array.index_space();
    for index in space.iter() {
        array.write(index, value)?;
    }
    Ok(())
}

/// Host-read every element and compare against `expected`
pub fn read_and_verify<T: Element, const N: usize>(array: &SharedArray<T, N>, expected: T) -> Result<bool> {
    Ok(matches_expected(array, expected)?)
}

/// Host-add `delta` to every element
pub fn increment<T, const N: usize>(array: &mut SharedArray<T, N>, delta: T) -> Result<()>
where
    T: Element + Add<Output = T>,
{
    Ok(array.increment_all(delta)?)
}

/// Device-add `delta` to every element on the array's own view
pub fn device_increment<T, const N: usize>(array: &SharedArray<T, N>, delta: T) -> Result<()>
where
    T: Element + Add<Output = T>,
{
    let dev = array.device_view();
    parallel_for_each(array.accelerator_view(), array.extent(), &[array], move |idx| {
        dev.update(idx, |v| v + delta)
    })?;
    Ok(())
}

/// Device-set every element to `value`
pub fn device_fill<T: Element, const N: usize>(array: &SharedArray<T, N>, value: T) -> Result<()> {
    let dev = array.device_view();
    parallel_for_each(array.accelerator_view(), array.extent(), &[array], move |idx| dev.set(idx, value))?;
    Ok(())
}

/// Count elements differing from `expected` without host access to the array
///
/// Runs a comparison kernel and waits for it, so it works for every access
/// type including [`AccessType::None`].
pub fn device_count_mismatches<T: Element, const N: usize>(array: &SharedArray<T, N>, expected: T) -> Result<usize> {
    let dev = array.device_view();
    let mismatches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&mismatches);

    parallel_for_each(array.accelerator_view(), array.extent(), &[array], move |idx| {
        if dev.get(idx) != expected {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    })?
    .wait();

    Ok(mismatches.load(Ordering::Relaxed))
}
