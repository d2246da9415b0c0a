//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! contest-standings service, including environment variable and TOML file
//! loading and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Collect Prometheus metrics and print them on exit
    pub metrics_enabled: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "contest-standings".to_string(),
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(enabled) = env::var("METRICS_ENABLED") {
            self.service.metrics_enabled = enabled
                .parse()
                .map_err(|_| anyhow!("Invalid METRICS_ENABLED value: {}", enabled))?;
        }

        // Rating settings
        if let Ok(policy) = env::var("RATING_POLICY") {
            self.rating.policy = policy.parse()?;
        }
        if let Ok(rating) = env::var("DEFAULT_RATING") {
            self.rating.default_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_RATING value: {}", rating))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    if config.rating.default_rating < 0 {
        return Err(anyhow!("Default rating cannot be negative"));
    }

    Ok(())
}
