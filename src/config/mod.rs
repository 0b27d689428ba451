//! Configuration management for adsky
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::distribution::{DEFAULT_FORMULA, DEFAULT_PREFERRED_HOUR, HOURS_PER_DAY};
use crate::expression::Expression;

/// Variables a distribution formula may reference
pub const FORMULA_VARIABLES: [&str; 3] = ["h", "x", "n"];

/// Accepted values for `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ad distribution configuration
    #[serde(default)]
    pub ads: AdsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ad distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdsConfig {
    /// Hour of day (0-23) around which ad volume peaks
    #[serde(default = "default_preferred_hour")]
    pub preferred_hour: u32,

    /// Formula over `h`, `x` and `n`
    #[serde(default = "default_distribution_function")]
    pub distribution_function: String,

    /// Worlds ads are never shown in
    #[serde(default = "default_world_blacklist")]
    pub world_blacklist: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_preferred_hour() -> u32 {
    DEFAULT_PREFERRED_HOUR
}

fn default_distribution_function() -> String {
    DEFAULT_FORMULA.to_string()
}

fn default_world_blacklist() -> Vec<String> {
    vec![
        String::from("WorldA"),
        String::from("WorldB"),
        String::from("WorldC"),
    ]
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            preferred_hour: default_preferred_hour(),
            distribution_function: default_distribution_function(),
            world_blacklist: default_world_blacklist(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl AdsConfig {
    /// Check whether ads are suppressed in a world (case-insensitive)
    pub fn is_world_blacklisted(&self, world: &str) -> bool {
        self.world_blacklist
            .iter()
            .any(|w| w.eq_ignore_ascii_case(world))
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive for this configuration
    ///
    /// `verbose` forces debug output for the crate regardless of `level`.
    pub fn filter_directive(&self, verbose: bool) -> String {
        let level = if verbose { "debug" } else { self.level.as_str() };
        format!("adsky={level},warn")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = AdsConfig::default();

        let preferred_hour = match std::env::var("ADSKY_PREFERRED_HOUR") {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("ADSKY_PREFERRED_HOUR is not an hour: {v}"))?,
            Err(_) => defaults.preferred_hour,
        };

        let distribution_function = std::env::var("ADSKY_DISTRIBUTION_FUNCTION")
            .unwrap_or(defaults.distribution_function);

        let world_blacklist = std::env::var("ADSKY_WORLD_BLACKLIST")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.world_blacklist);

        let logging = LoggingConfig::default();
        let level = std::env::var("ADSKY_LOG_LEVEL").unwrap_or(logging.level);
        let format = std::env::var("ADSKY_LOG_FORMAT").unwrap_or(logging.format);

        Ok(Self {
            ads: AdsConfig {
                preferred_hour,
                distribution_function,
                world_blacklist,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ads.preferred_hour >= HOURS_PER_DAY {
            anyhow::bail!(
                "preferred-hour must be between 0 and 23, got {}",
                self.ads.preferred_hour
            );
        }

        let formula = Expression::parse(&self.ads.distribution_function).with_context(|| {
            format!(
                "Invalid distribution-function: {}",
                self.ads.distribution_function
            )
        })?;

        let unknown: Vec<_> = formula
            .variables()
            .into_iter()
            .filter(|v| !FORMULA_VARIABLES.contains(v))
            .collect();
        if !unknown.is_empty() {
            anyhow::bail!(
                "distribution-function references unknown variable(s): {}",
                unknown.join(", ")
            );
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging format must be 'text' or 'json'");
        }

        Ok(())
    }
}
