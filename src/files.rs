//! files
//!
//! File manifest generation for non-image artifact promotion.
//!
//! Walks a directory tree and records every regular file's path (relative
//! to the base directory, `/`-separated) with its SHA-256. Entries are
//! sorted by name so the manifest is stable across filesystems.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from file manifest generation.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("must specify a base directory")]
    MissingBaseDir,

    #[error("error walking path '{path}': {source}")]
    Walk { path: PathBuf, source: io::Error },

    #[error("error hashing file '{path}': {source}")]
    Hash { path: PathBuf, source: io::Error },

    #[error("expected path '{path}' to be under '{base}'")]
    OutsideBase { path: PathBuf, base: PathBuf },
}

/// One file in a [`FileManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the base directory
    pub name: String,
    /// Lowercase hex SHA-256 of the contents
    pub sha256: String,
}

/// Files to promote, with their content hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub files: Vec<FileEntry>,
}

/// Build a manifest of every file under `base_dir`.
///
/// # Errors
///
/// Returns [`HashError::MissingBaseDir`] for an empty path, or an error
/// naming the path that could not be walked or hashed.
pub fn generate_file_manifest(base_dir: &Path) -> Result<FileManifest, HashError> {
    if base_dir.as_os_str().is_empty() {
        return Err(HashError::MissingBaseDir);
    }

    let mut files = Vec::new();
    walk(base_dir, base_dir, &mut files)?;
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(FileManifest { files })
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<FileEntry>) -> Result<(), HashError> {
    let walk_err = |source| HashError::Walk {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(walk_err)? {
        let path = entry.map_err(walk_err)?.path();
        if path.is_dir() {
            walk(base, &path, out)?;
            continue;
        }

        let relative = path.strip_prefix(base).map_err(|_| HashError::OutsideBase {
            path: path.clone(),
            base: base.to_path_buf(),
        })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let sha256 = sha256_file(&path).map_err(|source| HashError::Hash {
            path: path.clone(),
            source,
        })?;
        out.push(FileEntry { name, sha256 });
    }

    Ok(())
}

/// Compute the lowercase hex SHA-256 of a file, streaming its contents.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
