//! Conformance runner
//!
//! Runs the CPU-shared-memory scenarios for i32 (rank 1), f32 (rank 2) and
//! f64 (rank 3) and exits with the combined verdict: 0 pass, 1 fail, 2 skip.
//!
//! An optional argument selects one scenario by name (`read_write`, `read`,
//! `write`, `none`).
//!
//! # Environment Variables
//!
//! - `AMP_CONFORMANCE_SEED`, `AMP_CONFORMANCE_MAX_DIM` - scenario inputs
//! - `AMP_DEVICE_MEMORY_BYTES`, `AMP_DISABLE_ZERO_COPY`, ... - device config
//! - `AMP_TRACING_PROFILE`, `AMP_TRACING_DIRECTIVES`, `RUST_LOG` - logging

use amp_conformance::scenarios::cpu_shared_memory::{self, ScenarioElement};
use amp_conformance::{require_device_for, HarnessError, Result, RunResult, ScenarioConfig};
use amp_tracing::{init_global_tracing, TracingConfig};
use std::process::ExitCode;

type Scenario = fn(&amp_core::Accelerator, &ScenarioConfig) -> Result<RunResult>;

const SCENARIOS: [&str; 4] = ["read_write", "read", "write", "none"];

fn scenario<T: ScenarioElement, const N: usize>(name: &str) -> Option<Scenario> {
    match name {
        "read_write" => Some(cpu_shared_memory::read_write::<T, N> as Scenario),
        "read" => Some(cpu_shared_memory::read::<T, N> as Scenario),
        "write" => Some(cpu_shared_memory::write::<T, N> as Scenario),
        "none" => Some(cpu_shared_memory::none::<T, N> as Scenario),
        _ => None,
    }
}

fn run_case<T: ScenarioElement, const N: usize>(name: &str, config: &ScenarioConfig) -> RunResult {
    let element = std::any::type_name::<T>();
    let Some(run) = scenario::<T, N>(name) else {
        tracing::error!(scenario = name, "unknown scenario");
        return RunResult::Fail;
    };

    let outcome = require_device_for::<T>().and_then(|accelerator| run(&accelerator, config));
    let result = match outcome {
        Ok(result) => result,
        Err(HarnessError::NoCompatibleDevice { element, reason }) => {
            tracing::warn!(element, %reason, "no compatible device: Skipping");
            RunResult::Skip
        }
        Err(e) => {
            tracing::error!(error = %e, "scenario aborted");
            RunResult::Fail
        }
    };

    tracing::info!(scenario = name, element, rank = N, %result, "scenario_complete");
    println!("{name:<12} {element:<4} rank {N}  {result}");
    result
}

fn main() -> ExitCode {
    if let Err(e) = init_global_tracing(&TracingConfig::from_env()) {
        eprintln!("failed to initialize tracing: {e}");
    }

    let config = match ScenarioConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(RunResult::Fail.exit_code() as u8);
        }
    };

    let selected: Vec<String> = match std::env::args().nth(1) {
        Some(name) => vec![name],
        None => SCENARIOS.iter().map(|s| s.to_string()).collect(),
    };

    let mut results = Vec::new();
    for name in &selected {
        results.push(run_case::<i32, 1>(name, &config));
        results.push(run_case::<f32, 2>(name, &config));
        results.push(run_case::<f64, 3>(name, &config));
    }

    let verdict = RunResult::combine(results);
    println!("result: {verdict}");
    ExitCode::from(verdict.exit_code() as u8)
}
