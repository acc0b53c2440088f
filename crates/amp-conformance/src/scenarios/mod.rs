//! Conformance scenarios

pub mod cpu_shared_memory;
