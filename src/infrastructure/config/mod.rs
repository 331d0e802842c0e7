//! Hierarchical configuration loading.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::OrchestratorConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid worker_pool_size: {0}. Must be between 1 and 64")]
    InvalidPoolSize(usize),

    #[error("Invalid max_fix_cycles: {0}. Must be at least 1")]
    InvalidMaxFixCycles(u32),

    #[error("Invalid task_timeout_secs: {0}. Must be positive")]
    InvalidTaskTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid denied command pattern '{pattern}': {source}")]
    InvalidDeniedPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Routing model alias for the {0} tier cannot be empty")]
    EmptyModelAlias(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .taskforge/config.yaml (project config)
    /// 3. .taskforge/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TASKFORGE_* prefix, highest priority)
    pub fn load() -> Result<OrchestratorConfig> {
        let config: OrchestratorConfig = Figment::new()
            .merge(Serialized::defaults(OrchestratorConfig::default()))
            .merge(Yaml::file(".taskforge/config.yaml"))
            .merge(Yaml::file(".taskforge/local.yaml"))
            .merge(Env::prefixed("TASKFORGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<OrchestratorConfig> {
        let config: OrchestratorConfig = Figment::new()
            .merge(Serialized::defaults(OrchestratorConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &OrchestratorConfig) -> Result<(), ConfigError> {
        if config.scheduler.worker_pool_size == 0 || config.scheduler.worker_pool_size > 64 {
            return Err(ConfigError::InvalidPoolSize(
                config.scheduler.worker_pool_size,
            ));
        }

        if config.scheduler.max_fix_cycles == 0 {
            return Err(ConfigError::InvalidMaxFixCycles(
                config.scheduler.max_fix_cycles,
            ));
        }

        if config.scheduler.task_timeout_secs == 0 {
            return Err(ConfigError::InvalidTaskTimeout(
                config.scheduler.task_timeout_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        // Denied patterns must compile; a broken denylist is a config error,
        // not a silently weaker gate.
        for pattern in &config.gates.denied_command_patterns {
            if let Err(source) = regex::Regex::new(pattern) {
                return Err(ConfigError::InvalidDeniedPattern {
                    pattern: pattern.clone(),
                    source,
                });
            }
        }

        if config.routing.fast_model.is_empty() {
            return Err(ConfigError::EmptyModelAlias("fast"));
        }
        if config.routing.balanced_model.is_empty() {
            return Err(ConfigError::EmptyModelAlias("balanced"));
        }
        if config.routing.powerful_model.is_empty() {
            return Err(ConfigError::EmptyModelAlias("powerful"));
        }

        Ok(())
    }
}
