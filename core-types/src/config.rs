// Copyright (c) James Kassemi, SC, US. All rights reserved.

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Pubkey;

pub const DEFAULT_CACHE_TTL_SECS: i64 = 30;
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Projector knobs. Every field has a default so an empty source is valid
/// apart from the program id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectorConfig {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub program_id: Pubkey,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_label() -> String {
    "pools".to_string()
}

fn default_cache_ttl_secs() -> i64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            program_id: Pubkey::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_results: DEFAULT_MAX_RESULTS,
            retry: RetrySettings::default(),
        }
    }
}

/// Backoff settings for fetchers wrapped in a retry decorator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_pct")]
    pub jitter_pct: f64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2_000
}

fn default_jitter_pct() -> f64 {
    0.2
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_pct: default_jitter_pct(),
        }
    }
}

impl ProjectorConfig {
    /// Load from an optional `projector.toml` overlaid with `PROJECTOR_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("projector.toml")
    }

    /// Same as [`ProjectorConfig::load`] with an explicit, optional file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("PROJECTOR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program_id == Pubkey::default() {
            return Err(ConfigError::Message("PROJECTOR_PROGRAM_ID is required".to_string()));
        }
        if self.cache_ttl_secs <= 0 {
            return Err(ConfigError::Message("cache_ttl_secs must be positive".to_string()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Message("max_results must be positive".to_string()));
        }
        Ok(())
    }
}
