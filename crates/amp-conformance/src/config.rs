//! Scenario configuration

use crate::error::{HarnessError, Result};
use std::env;

/// Knobs shared by every scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Seed for extent generation
    pub seed: u64,
    /// Upper bound on each component of a random extent
    pub max_dim_size: usize,
    /// Device/host increment rounds
    pub rounds: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            max_dim_size: 256,
            rounds: 100,
        }
    }
}

impl ScenarioConfig {
    /// Read `AMP_CONFORMANCE_SEED` and `AMP_CONFORMANCE_MAX_DIM` over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(seed) = parse_env("AMP_CONFORMANCE_SEED")? {
            config.seed = seed;
        }
        if let Some(max) = parse_env("AMP_CONFORMANCE_MAX_DIM")? {
            config.max_dim_size = max;
        }
        if config.max_dim_size == 0 {
            return Err(HarnessError::InvalidConfig("AMP_CONFORMANCE_MAX_DIM must be positive".into()));
        }
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HarnessError::InvalidConfig(format!("{key}={raw:?} is not a valid number"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("AMP_CONFORMANCE_SEED", "99");
        env::set_var("AMP_CONFORMANCE_MAX_DIM", "64");
        let config = ScenarioConfig::from_env().unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.max_dim_size, 64);
        assert_eq!(config.rounds, 100);

        env::set_var("AMP_CONFORMANCE_MAX_DIM", "0");
        assert!(ScenarioConfig::from_env().is_err());

        env::remove_var("AMP_CONFORMANCE_SEED");
        env::remove_var("AMP_CONFORMANCE_MAX_DIM");
    }
}
