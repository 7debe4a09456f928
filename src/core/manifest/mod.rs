//! core::manifest
//!
//! Promotion manifest model and loading.
//!
//! # Modules
//!
//! - [`schema`] - Manifest value types
//!
//! # Loading
//!
//! [`load_manifests`] accepts either a single manifest file or a directory.
//! Directories are walked recursively and every `*.toml` / `*.json` file is
//! loaded in sorted path order, so the resulting sequence does not depend
//! on filesystem iteration order.
//!
//! # Example
//!
//! ```no_run
//! use imagepromoter::core::manifest::load_manifests;
//! use std::path::Path;
//!
//! let manifests = load_manifests(Path::new("manifests/")).unwrap();
//! println!("loaded {} manifests", manifests.len());
//! ```

pub mod schema;

pub use schema::{DigestTags, Image, Manifest, RegistryContext};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("unsupported manifest format '{path}' (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("no manifests found under '{path}'")]
    Empty { path: PathBuf },
}

/// Load all manifests at `path`.
///
/// # Errors
///
/// Returns an error naming the offending path if any file cannot be read
/// or parsed, or if a directory contains no manifest files.
pub fn load_manifests(path: &Path) -> Result<Vec<Manifest>, ManifestError> {
    if !path.is_dir() {
        return Ok(vec![load_manifest_file(path)?]);
    }

    let mut files = Vec::new();
    collect_manifest_files(path, &mut files)?;
    files.sort();

    if files.is_empty() {
        return Err(ManifestError::Empty {
            path: path.to_path_buf(),
        });
    }

    files.iter().map(|file| load_manifest_file(file)).collect()
}

/// Load and parse a single manifest file, choosing the format by extension.
pub fn load_manifest_file(path: &Path) -> Result<Manifest, ManifestError> {
    let format = ManifestFormat::from_path(path).ok_or_else(|| {
        ManifestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }
    })?;

    let content = fs::read_to_string(path).map_err(|e| ManifestError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    format
        .parse(&content)
        .map_err(|message| ManifestError::ParseError {
            path: path.to_path_buf(),
            message,
        })
}

fn collect_manifest_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ManifestError> {
    let entries = fs::read_dir(dir).map_err(|e| ManifestError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ManifestError::ReadError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_manifest_files(&path, out)?;
        } else if ManifestFormat::from_path(&path).is_some() {
            out.push(path);
        }
    }

    Ok(())
}

/// On-disk manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> Result<Manifest, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}
