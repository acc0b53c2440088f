//! Device implementations

pub mod cpu;

pub use cpu::{CpuDevice, CpuQueue};
