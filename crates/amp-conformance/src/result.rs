//! Pass/fail/skip verdicts

use std::fmt;

/// Outcome of one conformance scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunResult {
    Pass,
    Fail,
    /// The device cannot run the scenario at all
    Skip,
}

impl RunResult {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            RunResult::Pass
        } else {
            RunResult::Fail
        }
    }

    /// Process exit code: pass 0, fail 1, skip 2
    pub const fn exit_code(self) -> i32 {
        match self {
            RunResult::Pass => 0,
            RunResult::Fail => 1,
            RunResult::Skip => 2,
        }
    }

    /// Verdict for a batch: any failure fails, all skipped skips, otherwise pass
    pub fn combine(results: impl IntoIterator<Item = RunResult>) -> Self {
        let mut any_pass = false;
        for result in results {
            match result {
                RunResult::Fail => return RunResult::Fail,
                RunResult::Pass => any_pass = true,
                RunResult::Skip => {}
            }
        }
        if any_pass {
            RunResult::Pass
        } else {
            RunResult::Skip
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunResult::Pass => "PASS",
            RunResult::Fail => "FAIL",
            RunResult::Skip => "SKIP",
        })
    }
}
