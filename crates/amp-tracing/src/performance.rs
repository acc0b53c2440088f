//! Performance instrumentation: RAII span timers and standard runtime events.
//!
//! ```rust
//! use amp_tracing::performance::{record_allocation, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("fence", Some(100));
//! drop(span); // logged only if it took at least 100us
//!
//! record_allocation(4096, "HostShared", 12);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::Level;

static PERF_ENABLED: AtomicBool = AtomicBool::new(true);
// u64::MAX encodes "no global threshold".
static PERF_THRESHOLD_US: AtomicU64 = AtomicU64::new(u64::MAX);

/// Toggle performance span logging process-wide.
///
/// Called by [`crate::build_subscriber`] from the active configuration.
pub fn set_enabled(enabled: bool, threshold_us: Option<u64>) {
    PERF_ENABLED.store(enabled, Ordering::Relaxed);
    PERF_THRESHOLD_US.store(threshold_us.unwrap_or(u64::MAX), Ordering::Relaxed);
}

/// Whether performance spans are currently logged.
pub fn is_enabled() -> bool {
    PERF_ENABLED.load(Ordering::Relaxed)
}

fn global_threshold() -> Option<u64> {
    match PERF_THRESHOLD_US.load(Ordering::Relaxed) {
        u64::MAX => None,
        threshold => Some(threshold),
    }
}

/// RAII guard that times a region and logs its duration when dropped.
///
/// A span with its own threshold ignores the global one.
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Create a debug-level span. `threshold_us = None` defers to the global threshold.
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self::with_level(Level::DEBUG, name, threshold_us)
    }

    /// Create a span at an explicit level.
    pub fn with_level(level: Level, name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = match level {
            Level::TRACE => tracing::trace_span!("perf", name = %name),
            Level::DEBUG => tracing::debug_span!("perf", name = %name),
            Level::INFO => tracing::info_span!("perf", name = %name),
            Level::WARN => tracing::warn_span!("perf", name = %name),
            Level::ERROR => tracing::error_span!("perf", name = %name),
        };

        Self {
            name,
            threshold_us,
            start_time: Instant::now(),
            span,
        }
    }

    /// Name the span was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Microseconds since creation.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Enter this span's context.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }

        let elapsed_us = self.elapsed_us();
        let threshold = self.threshold_us.or_else(global_threshold);
        if threshold.is_none_or(|t| elapsed_us >= t) {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Record a device buffer allocation.
pub fn record_allocation(size_bytes: usize, storage: &str, duration_us: u64) {
    tracing::debug!(
        event = "allocation",
        size_bytes = size_bytes,
        size_kb = size_bytes as f64 / 1024.0,
        storage = storage,
        duration_us = duration_us,
        "device_allocation"
    );
}

/// Record a kernel submission and its size.
pub fn record_dispatch(kernel: &str, elements: usize, queue_depth: usize) {
    tracing::debug!(
        event = "dispatch",
        kernel = kernel,
        elements = elements,
        queue_depth = queue_depth,
        "kernel_dispatch"
    );
}

/// Record a completed kernel with its element throughput.
pub fn record_execution(kernel: &str, elements: usize, duration_us: u64) {
    let elements_per_sec = if duration_us > 0 {
        (elements as f64 / duration_us as f64) * 1_000_000.0
    } else {
        0.0
    };

    tracing::debug!(
        event = "execution",
        kernel = kernel,
        elements = elements,
        duration_us = duration_us,
        elements_per_sec = elements_per_sec,
        "kernel_complete"
    );
}

/// Record a host/device data transfer (`"H2D"`, `"D2H"`).
pub fn record_transfer(bytes: usize, direction: &str, duration_us: u64) {
    let bandwidth_mbps = if duration_us > 0 {
        (bytes as f64 / duration_us as f64) * 1_000_000.0 / (1024.0 * 1024.0)
    } else {
        0.0
    };

    tracing::debug!(
        event = "transfer",
        bytes = bytes,
        direction = direction,
        duration_us = duration_us,
        bandwidth_mbps = bandwidth_mbps,
        "data_transfer"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_performance_span_creation() {
        let span = PerformanceSpan::new("test_span", None);
        assert_eq!(span.name(), "test_span");
        assert_eq!(span.threshold_us, None);
    }

    #[test]
    fn test_performance_span_elapsed() {
        let span = PerformanceSpan::new("sleepy", Some(1_000_000));
        thread::sleep(Duration::from_millis(5));
        assert!(span.elapsed_us() >= 5_000);
    }

    #[test]
    fn test_performance_span_with_level() {
        let span = PerformanceSpan::with_level(Level::INFO, "info_span", Some(100));
        assert_eq!(span.threshold_us, Some(100));
    }

    #[test]
    fn test_record_events() {
        record_allocation(1024, "DeviceOnly", 3);
        record_dispatch("add_one", 16, 1);
        record_execution("add_one", 16, 0);
        record_transfer(4096, "D2H", 250);
    }
}
