//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [checks]
//! max_image_size_mb = 2048
//! image_removal = true
//!
//! [sizes]
//! concurrency = 10
//! registry_endpoint = "http://localhost:5000"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: sizes and concurrency must be
//! positive, and the endpoint must be an http(s) URL.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Check settings
    pub checks: Option<ChecksConfig>,

    /// Size lookup settings
    pub sizes: Option<SizesConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(checks) = &self.checks {
            checks.validate()?;
        }
        if let Some(sizes) = &self.sizes {
            sizes.validate()?;
        }
        Ok(())
    }
}

/// `[checks]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksConfig {
    /// Size ceiling in decimal megabytes; the size check is off when unset
    pub max_image_size_mb: Option<u64>,

    /// Whether to run the image removal check when a baseline is given
    pub image_removal: Option<bool>,
}

impl ChecksConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_image_size_mb == Some(0) {
            return Err(ConfigError::InvalidValue(
                "checks.max_image_size_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[sizes]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SizesConfig {
    /// Maximum concurrent size lookups
    pub concurrency: Option<usize>,

    /// Send registry size queries here instead of each registry host
    pub registry_endpoint: Option<String>,
}

impl SizesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sizes.concurrency must be positive".to_string(),
            ));
        }
        if let Some(endpoint) = &self.registry_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "sizes.registry_endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}
