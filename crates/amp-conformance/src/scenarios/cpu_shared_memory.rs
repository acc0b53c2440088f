//! Arrays with an explicit CPU access type on a zero-copy accelerator
//!
//! Every scenario builds one array over a random extent, confirms the
//! negotiated access type, then alternates device and host increments for
//! `rounds` rounds starting from 100. Host steps are only taken where the
//! access type allows them; verification falls back to a device-side
//! comparison kernel when the host cannot read.
//!
//! | scenario     | host writes | host reads | expected after rounds |
//! |--------------|-------------|------------|-----------------------|
//! | `read_write` | yes         | yes        | 100 + 2 * rounds      |
//! | `read`       | no          | yes        | 100 + rounds          |
//! | `write`      | yes         | no         | 100 + rounds          |
//! | `none`       | no          | no         | 100 + rounds          |

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::extent::random_extent;
use crate::helpers::{
    device_count_mismatches, device_fill, device_increment, increment, read_and_verify, verify_cpu_access_type,
    write_all,
};
use crate::result::RunResult;
use amp_core::{AccessType, Accelerator, Element, Error, SharedArray};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::Add;

/// Element types the scenarios run over
pub trait ScenarioElement: Element + Add<Output = Self> + From<u8> {}

impl<T> ScenarioElement for T where T: Element + Add<Output = T> + From<u8> {}

/// `start + rounds * step`, by repeated addition so it stays exact for every element type
fn after_rounds<T: ScenarioElement>(start: T, rounds: u32, step: T) -> T {
    (0..rounds).fold(start, |acc, _| acc + step)
}

fn skip_without_zero_copy(accelerator: &Accelerator) -> bool {
    if accelerator.supports_cpu_shared_memory() {
        return false;
    }
    tracing::warn!(
        device = accelerator.description(),
        "The accelerator does not support zero copy: Skipping"
    );
    true
}

fn new_array<T: ScenarioElement, const N: usize>(
    accelerator: &Accelerator,
    config: &ScenarioConfig,
    access: AccessType,
) -> Result<SharedArray<T, N>> {
    let extent = random_extent::<N>(&mut StdRng::seed_from_u64(config.seed), config.max_dim_size)?;
    tracing::info!(%extent, %access, element = std::any::type_name::<T>(), "scenario_array");
    Ok(SharedArray::new(extent, &accelerator.default_view(), access)?)
}

fn expect_denied<T>(result: amp_core::Result<T>, operation: &str) -> bool {
    match result {
        Err(Error::AccessDenied { .. }) => true,
        Err(e) => {
            tracing::error!(operation, error = %e, "expected AccessDenied");
            false
        }
        Ok(_) => {
            tracing::error!(operation, "host access succeeded on an array that forbids it");
            false
        }
    }
}

/// Read-write array: host and device both increment every round
pub fn read_write<T: ScenarioElement, const N: usize>(
    accelerator: &Accelerator,
    config: &ScenarioConfig,
) -> Result<RunResult> {
    if skip_without_zero_copy(accelerator) {
        return Ok(RunResult::Skip);
    }

    let mut arr = new_array::<T, N>(accelerator, config, AccessType::ReadWrite)?;
    if !verify_cpu_access_type(&arr, AccessType::ReadWrite) {
        return Ok(RunResult::Fail);
    }

    let start = T::from(100u8);
    write_all(&mut arr, start)?;
    if !read_and_verify(&arr, start)? {
        return Ok(RunResult::Fail);
    }

    let one = T::from(1u8);
    for _ in 0..config.rounds {
        device_increment(&arr, one)?;
        increment(&mut arr, one)?;
    }

    let expected = after_rounds(start, config.rounds, one + one);
    Ok(RunResult::from_bool(read_and_verify(&arr, expected)?))
}

/// Read-only array: the device produces every value, the host observes
pub fn read<T: ScenarioElement, const N: usize>(accelerator: &Accelerator, config: &ScenarioConfig) -> Result<RunResult> {
    if skip_without_zero_copy(accelerator) {
        return Ok(RunResult::Skip);
    }

    let mut arr = new_array::<T, N>(accelerator, config, AccessType::Read)?;
    if !verify_cpu_access_type(&arr, AccessType::Read) {
        return Ok(RunResult::Fail);
    }

    let start = T::from(100u8);
    if !expect_denied(arr.fill(start), "fill") {
        return Ok(RunResult::Fail);
    }

    device_fill(&arr, start)?;
    if !read_and_verify(&arr, start)? {
        return Ok(RunResult::Fail);
    }

    let one = T::from(1u8);
    for _ in 0..config.rounds {
        device_increment(&arr, one)?;
    }

    let expected = after_rounds(start, config.rounds, one);
    Ok(RunResult::from_bool(read_and_verify(&arr, expected)?))
}

/// Write-only array: the host seeds values, a device kernel verifies
pub fn write<T: ScenarioElement, const N: usize>(accelerator: &Accelerator, config: &ScenarioConfig) -> Result<RunResult> {
    if skip_without_zero_copy(accelerator) {
        return Ok(RunResult::Skip);
    }

    let mut arr = new_array::<T, N>(accelerator, config, AccessType::Write)?;
    if !verify_cpu_access_type(&arr, AccessType::Write) {
        return Ok(RunResult::Fail);
    }
    if !expect_denied(arr.to_vec(), "to_vec") {
        return Ok(RunResult::Fail);
    }

    let start = T::from(100u8);
    write_all(&mut arr, start)?;
    if device_count_mismatches(&arr, start)? != 0 {
        return Ok(RunResult::Fail);
    }

    let one = T::from(1u8);
    for _ in 0..config.rounds {
        device_increment(&arr, one)?;
    }

    let expected = after_rounds(start, config.rounds, one);
    Ok(RunResult::from_bool(device_count_mismatches(&arr, expected)? == 0))
}

/// Device-only array: every host access is denied, device work still runs
///
/// Needs no zero-copy support.
pub fn none<T: ScenarioElement, const N: usize>(accelerator: &Accelerator, config: &ScenarioConfig) -> Result<RunResult> {
    let mut arr = new_array::<T, N>(accelerator, config, AccessType::None)?;
    if !verify_cpu_access_type(&arr, AccessType::None) {
        return Ok(RunResult::Fail);
    }

    let start = T::from(100u8);
    let origin = arr.index_space().iter().next();
    let denied = match origin {
        Some(idx) => expect_denied(arr.read(idx), "read") && expect_denied(arr.write(idx, start), "write"),
        None => false,
    };
    if !denied {
        return Ok(RunResult::Fail);
    }

    device_fill(&arr, start)?;
    let one = T::from(1u8);
    for _ in 0..config.rounds {
        device_increment(&arr, one)?;
    }

    let expected = after_rounds(start, config.rounds, one);
    Ok(RunResult::from_bool(device_count_mismatches(&arr, expected)? == 0))
}
