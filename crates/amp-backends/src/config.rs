//! Device configuration

use crate::backend::DeviceCapabilities;
use crate::error::{BackendError, Result};
use std::env;

/// Configuration for a [`CpuDevice`](crate::CpuDevice)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Name reported by `Device::description`
    pub description: String,
    pub supports_host_shared_memory: bool,
    pub supports_double_precision: bool,
    /// Allocation budget in bytes
    pub memory_bytes: usize,
    /// Upper bound on elements per dispatch
    pub max_dispatch_elements: usize,
    /// Kernel worker threads; 0 lets rayon pick
    pub worker_threads: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let caps = DeviceCapabilities::default();
        Self {
            description: "amp CPU accelerator".to_string(),
            supports_host_shared_memory: caps.supports_host_shared_memory,
            supports_double_precision: caps.supports_double_precision,
            memory_bytes: caps.dedicated_memory_bytes,
            max_dispatch_elements: caps.max_dispatch_elements,
            worker_threads: 0,
        }
    }
}

impl DeviceConfig {
    /// A device that cannot map memory into the host
    pub fn without_zero_copy() -> Self {
        Self {
            description: "amp CPU accelerator (discrete memory)".to_string(),
            supports_host_shared_memory: false,
            ..Self::default()
        }
    }

    /// Build a configuration from environment hints.
    ///
    /// # Environment Variables
    ///
    /// - `AMP_DEVICE_MEMORY_BYTES` - allocation budget
    /// - `AMP_DISABLE_ZERO_COPY` - `1`/`true` reports no host-shared memory
    /// - `AMP_DISABLE_DOUBLE_PRECISION` - `1`/`true` reports no f64 support
    /// - `AMP_WORKER_THREADS` - kernel worker thread count
    /// - `AMP_MAX_DISPATCH_ELEMENTS` - per-dispatch element limit
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(bytes) = parse_env::<usize>("AMP_DEVICE_MEMORY_BYTES")? {
            config.memory_bytes = bytes;
        }
        if env_flag("AMP_DISABLE_ZERO_COPY") {
            config.supports_host_shared_memory = false;
        }
        if env_flag("AMP_DISABLE_DOUBLE_PRECISION") {
            config.supports_double_precision = false;
        }
        if let Some(threads) = parse_env::<usize>("AMP_WORKER_THREADS")? {
            config.worker_threads = threads;
        }
        if let Some(limit) = parse_env::<usize>("AMP_MAX_DISPATCH_ELEMENTS")? {
            config.max_dispatch_elements = limit;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_bytes == 0 {
            return Err(BackendError::InvalidConfig("memory_bytes must be non-zero".into()));
        }
        if self.max_dispatch_elements == 0 {
            return Err(BackendError::InvalidConfig("max_dispatch_elements must be non-zero".into()));
        }
        Ok(())
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            supports_host_shared_memory: self.supports_host_shared_memory,
            supports_double_precision: self.supports_double_precision,
            dedicated_memory_bytes: self.memory_bytes,
            max_dispatch_elements: self.max_dispatch_elements,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BackendError::InvalidConfig(format!("{key}={raw:?} is not a valid number"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 5] = [
        "AMP_DEVICE_MEMORY_BYTES",
        "AMP_DISABLE_ZERO_COPY",
        "AMP_DISABLE_DOUBLE_PRECISION",
        "AMP_WORKER_THREADS",
        "AMP_MAX_DISPATCH_ELEMENTS",
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_match_capabilities() {
        let config = DeviceConfig::default();
        assert_eq!(config.capabilities(), DeviceCapabilities::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_without_zero_copy() {
        let caps = DeviceConfig::without_zero_copy().capabilities();
        assert!(!caps.supports_host_shared_memory);
        assert!(caps.supports_double_precision);
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();
        env::set_var("AMP_DEVICE_MEMORY_BYTES", "4096");
        env::set_var("AMP_DISABLE_ZERO_COPY", "true");
        env::set_var("AMP_WORKER_THREADS", "2");

        let config = DeviceConfig::from_env().unwrap();
        assert_eq!(config.memory_bytes, 4096);
        assert!(!config.supports_host_shared_memory);
        assert!(config.supports_double_precision);
        assert_eq!(config.worker_threads, 2);
        reset_env();
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();
        env::set_var("AMP_DEVICE_MEMORY_BYTES", "lots");
        assert!(matches!(DeviceConfig::from_env(), Err(BackendError::InvalidConfig(_))));

        env::set_var("AMP_DEVICE_MEMORY_BYTES", "0");
        assert!(matches!(DeviceConfig::from_env(), Err(BackendError::InvalidConfig(_))));
        reset_env();
    }
}
