//! Conformance harness for amp shared arrays
//!
//! The pieces a test needs around the runtime under test: accelerator
//! selection by element type, seeded random extents, host/device helpers,
//! a pass/fail/skip verdict, and the CPU-shared-memory scenario family.
//!
//! ```rust
//! use amp_conformance::{scenarios::cpu_shared_memory, RunResult, ScenarioConfig};
//! use amp_core::Accelerator;
//!
//! # fn main() -> amp_conformance::Result<()> {
//! let acc = Accelerator::new_cpu()?;
//! let config = ScenarioConfig {
//!     max_dim_size: 16,
//!     ..ScenarioConfig::default()
//! };
//! let result = cpu_shared_memory::read_write::<i32, 2>(&acc, &config)?;
//! assert_eq!(result, RunResult::Pass);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod extent;
pub mod helpers;
pub mod result;
pub mod scenarios;

pub use config::ScenarioConfig;
pub use device::{check_device_for, require_device_for};
pub use error::{HarnessError, Result};
pub use extent::random_extent;
pub use result::RunResult;
