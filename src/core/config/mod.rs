//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! The first existing file wins:
//! 1. Explicit path (`--config`); must exist
//! 2. `$CIP_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/cip/config.toml`
//! 4. `~/.cip/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use imagepromoter::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Concurrency: {}", config.concurrency());
//! if let Some(max) = config.max_image_size_mb() {
//!     println!("Max image size: {}MB", max);
//! }
//! ```

pub mod schema;

pub use schema::{ChecksConfig, FileConfig, SizesConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of concurrent size lookups.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CIP_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied by accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if a config
    /// file exists but cannot be parsed or fails validation. Missing
    /// default files are not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        let env = |key: &str| std::env::var(key).ok();
        match Self::search_paths(env, dirs::home_dir())
            .into_iter()
            .find(|p| p.exists())
        {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Candidate config paths in search order.
    fn search_paths(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = env(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("cip/config.toml"));
        }
        if let Some(home) = home {
            paths.push(home.join(".cip/config.toml"));
        }
        paths
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Size ceiling in megabytes, if the size check is enabled.
    pub fn max_image_size_mb(&self) -> Option<u64> {
        self.file.checks.as_ref().and_then(|c| c.max_image_size_mb)
    }

    /// Whether the image removal check runs when a baseline is supplied.
    ///
    /// Defaults to `true`.
    pub fn image_removal(&self) -> bool {
        self.file
            .checks
            .as_ref()
            .and_then(|c| c.image_removal)
            .unwrap_or(true)
    }

    /// Maximum concurrent size lookups.
    ///
    /// Defaults to [`DEFAULT_CONCURRENCY`].
    pub fn concurrency(&self) -> usize {
        self.file
            .sizes
            .as_ref()
            .and_then(|s| s.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// Registry endpoint override for size queries.
    pub fn registry_endpoint(&self) -> Option<&str> {
        self.file
            .sizes
            .as_ref()
            .and_then(|s| s.registry_endpoint.as_deref())
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
