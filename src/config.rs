//! Configuration management for Ratekey.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{KeyError, Result};
use crate::ratelimit::LimitCategory;

/// Main configuration for Ratekey.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Known limit categories. Empty means any non-empty label is accepted.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A configured limit category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category label as it appears in bucket keys
    pub name: LimitCategory,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON formatted log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl KeyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: KeyConfig = serde_yaml::from_str(yaml)
            .map_err(|e| KeyError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|c| c.name == category.name) {
                return Err(KeyError::Config(format!(
                    "Duplicate category: {}",
                    category.name
                )));
            }
        }
        Ok(())
    }

    /// Turn a caller-supplied label into a category allowed by this config.
    pub fn resolve_category(&self, label: &str) -> Result<LimitCategory> {
        let category = LimitCategory::new(label)?;

        if self.categories.is_empty() || self.categories.iter().any(|c| c.name == category) {
            return Ok(category);
        }

        warn!(category = %category, "Rejecting unknown limit category");
        Err(KeyError::UnknownCategory(category.into()))
    }
}
