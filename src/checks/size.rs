//! checks::size
//!
//! Validates every edge's artifact size against a configured ceiling.
//!
//! # Semantics
//!
//! With `threshold = max_image_size_mb × 1,000,000` bytes, a size `s`
//! passes iff `0 < s <= threshold`. Sizes above the threshold are reported
//! as oversized; sizes `<= 0` (including digests with no size data at all)
//! are reported as invalid, since they point at an upstream data problem
//! rather than a policy violation.
//!
//! When one image name reaches the check through several digests, each map
//! keeps that name's worst size: the largest oversized value and the
//! smallest invalid value.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use super::{CheckError, StandaloneCheck};
use crate::core::edges::EdgeSet;
use crate::core::types::{bytes_to_mb, mb_to_bytes, Digest, ImageName};

/// Sizes in bytes keyed by digest, as supplied by a size lookup.
pub type DigestSizes = HashMap<Digest, i64>;

/// Structured size violation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{}", render_violations(.max_image_size_mb, .oversized, .invalid))]
pub struct ImageSizeError {
    /// Configured ceiling in megabytes
    pub max_image_size_mb: u64,
    /// Images over the ceiling, with their size in bytes
    pub oversized: BTreeMap<ImageName, i64>,
    /// Images with missing or non-positive size data
    pub invalid: BTreeMap<ImageName, i64>,
}

fn render_violations(
    max_image_size_mb: &u64,
    oversized: &BTreeMap<ImageName, i64>,
    invalid: &BTreeMap<ImageName, i64>,
) -> String {
    let mut out = String::new();
    if !oversized.is_empty() {
        out.push_str(&format!(
            "The following images were over the max file size of {}MB:\n",
            max_image_size_mb
        ));
        for (name, size) in oversized {
            out.push_str(&format!("{} ({} MB)\n", name, bytes_to_mb(*size)));
        }
    }
    if !invalid.is_empty() {
        out.push_str("The following images had an invalid image size:\n");
        for (name, size) in invalid {
            out.push_str(&format!("{} ({} bytes)\n", name, size));
        }
    }
    out
}

/// Standalone check holding its own side data.
///
/// The caller fills `digest_size_bytes` and `edges` before calling
/// [`ImageSizeCheck::check_sizes`].
#[derive(Debug, Clone, Default)]
pub struct ImageSizeCheck {
    pub max_image_size_mb: u64,
    pub digest_size_bytes: DigestSizes,
    pub edges: EdgeSet,
}

impl ImageSizeCheck {
    /// Create a check with a ceiling and no side data yet.
    pub fn new(max_image_size_mb: u64) -> Self {
        Self {
            max_image_size_mb,
            ..Self::default()
        }
    }

    /// Set the edges to validate (builder style).
    pub fn with_edges(mut self, edges: EdgeSet) -> Self {
        self.edges = edges;
        self
    }

    /// Set the per-digest sizes (builder style).
    pub fn with_sizes(mut self, sizes: DigestSizes) -> Self {
        self.digest_size_bytes = sizes;
        self
    }

    /// The ceiling in bytes.
    pub fn threshold_bytes(&self) -> i64 {
        let mb = i64::try_from(self.max_image_size_mb).unwrap_or(i64::MAX);
        mb_to_bytes(mb)
    }

    /// Validate every edge against the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`ImageSizeError`] if any edge is oversized or lacks a
    /// positive size.
    pub fn check_sizes(&self) -> Result<(), ImageSizeError> {
        let threshold = self.threshold_bytes();
        let mut oversized: BTreeMap<ImageName, i64> = BTreeMap::new();
        let mut invalid: BTreeMap<ImageName, i64> = BTreeMap::new();

        for edge in &self.edges {
            let size = self.digest_size_bytes.get(&edge.digest).copied().unwrap_or(0);

            if size > threshold {
                let entry = oversized.entry(edge.image_name.clone()).or_insert(size);
                *entry = (*entry).max(size);
            } else if size <= 0 {
                let entry = invalid.entry(edge.image_name.clone()).or_insert(size);
                *entry = (*entry).min(size);
            }
        }

        if oversized.is_empty() && invalid.is_empty() {
            Ok(())
        } else {
            Err(ImageSizeError {
                max_image_size_mb: self.max_image_size_mb,
                oversized,
                invalid,
            })
        }
    }
}

impl StandaloneCheck for ImageSizeCheck {
    fn name(&self) -> &'static str {
        "image-size"
    }

    fn run(&self) -> Result<(), CheckError> {
        self.check_sizes().map_err(CheckError::from)
    }
}
