//! Convenience macros for performance tracing.

/// Create a [`crate::performance::PerformanceSpan`] with optional fields.
///
/// ```rust
/// use amp_tracing::perf_span;
///
/// {
///     let _span = perf_span!("increment_all", elements = 16);
///     // ... work ...
/// } // duration logged here
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        let _span = tracing::debug_span!(
            "perf",
            name = $name,
            $($field = $value),+
        ).entered();
        $crate::performance::PerformanceSpan::new($name, None)
    }};
}

/// Emit a debug-level event tagged with `event = $name`.
///
/// ```rust
/// use amp_tracing::perf_event;
///
/// perf_event!("fence_wait", pending = 2, waited_us = 40);
/// ```
#[macro_export]
macro_rules! perf_event {
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {
        tracing::debug!(
            event = $name,
            $($field = $value),+
        );
    };
}

/// Run a block and return `(result, duration_us)`, logging the duration.
#[macro_export]
macro_rules! timed_block {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration_us = start.elapsed().as_micros() as u64;
        tracing::debug!(operation = $name, duration_us = duration_us, "timed_block_complete");
        (result, duration_us)
    }};
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_perf_span_macro() {
        let _span = perf_span!("plain");
        let _fields = perf_span!("with_fields", size = 1024, rank = 2);
    }

    #[test]
    fn test_perf_event_macro() {
        perf_event!("test_event", metric = 100, label = "value");
    }

    #[test]
    fn test_timed_block_macro() {
        let (result, duration_us) = timed_block!("sleep", {
            thread::sleep(Duration::from_millis(2));
            7
        });
        assert_eq!(result, 7);
        assert!(duration_us >= 2_000);
    }
}
