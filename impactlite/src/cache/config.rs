// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache timing configuration.
///
/// Eviction is TTL-only; no size bound is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one.
    pub default_ttl: Duration,

    /// How often the background sweep removes expired entries.
    pub sweep_interval: Duration,

    /// TTL for cached dependency graphs.
    pub graph_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(1800),   // 30 minutes
            sweep_interval: Duration::from_secs(300), // 5 minutes
            graph_ttl: Duration::from_secs(3600),     // 1 hour
        }
    }
}

impl CacheConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl.is_zero() {
            return Err("default_ttl must be non-zero".to_string());
        }
        if self.sweep_interval.is_zero() {
            return Err("sweep_interval must be non-zero".to_string());
        }
        if self.graph_ttl.is_zero() {
            return Err("graph_ttl must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CacheConfig::default().validate().is_ok());
        assert_eq!(
            CacheConfig::default().default_ttl,
            Duration::from_secs(30 * 60)
        );
        assert_eq!(CacheConfig::default().graph_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let mut config = CacheConfig::default();
        config.sweep_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
