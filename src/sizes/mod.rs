//! sizes
//!
//! Artifact size lookups feeding [`crate::checks::ImageSizeCheck`].
//!
//! # Modules
//!
//! - [`registry`] - Size lookups against an OCI distribution registry
//!
//! # Design
//!
//! The `SizeLookup` trait is async because real lookups involve network
//! I/O. [`fetch_sizes`] resolves each unique digest once with at most
//! `concurrency` lookups in flight. On the first failure it stops starting
//! new lookups, lets in-flight ones finish, and returns that failure.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use imagepromoter::core::edges::EdgeSet;
//! use imagepromoter::sizes::{fetch_sizes, StaticSizes};
//!
//! # tokio_test::block_on(async {
//! let lookup = Arc::new(StaticSizes::new(HashMap::new()));
//! let sizes = fetch_sizes(lookup, &EdgeSet::new(), 4).await.unwrap();
//! assert!(sizes.is_empty());
//! # });
//! ```

pub mod registry;

pub use registry::RegistrySizeLookup;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::checks::DigestSizes;
use crate::core::edges::{EdgeSet, PromotionEdge};
use crate::core::types::Digest;

/// Errors from size lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SizeError {
    /// No size is known for the digest.
    #[error("no size data for {0}")]
    NotFound(String),

    /// Registry returned an error status.
    #[error("registry error for {reference}: HTTP {status}")]
    Http {
        /// Reference being looked up
        reference: String,
        /// HTTP status code
        status: u16,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// Registry response could not be understood.
    #[error("invalid registry response for {reference}: {message}")]
    InvalidResponse { reference: String, message: String },

    /// A lookup task panicked or was cancelled.
    #[error("size lookup task failed: {0}")]
    TaskFailed(String),

    /// Failed to read a size file.
    #[error("failed to read size file '{path}': {message}")]
    File { path: PathBuf, message: String },
}

/// Resolves the size in bytes of the artifact an edge references.
#[async_trait]
pub trait SizeLookup: Send + Sync {
    /// Size in bytes of `edge.digest`, fetched from `edge.src_registry`.
    async fn image_size(&self, edge: &PromotionEdge) -> Result<i64, SizeError>;
}

/// Size lookup over a fixed digest → bytes table.
///
/// A digest missing from the table reports size 0, which the size check
/// flags as invalid, matching a table handed to the check directly.
#[derive(Debug, Clone, Default)]
pub struct StaticSizes {
    sizes: DigestSizes,
}

impl StaticSizes {
    /// Wrap an existing table.
    pub fn new(sizes: DigestSizes) -> Self {
        Self { sizes }
    }

    /// Load a JSON object mapping digest strings to sizes in bytes.
    ///
    /// ```json
    /// { "sha256:000": 1000000, "sha256:111": 52428800 }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self, SizeError> {
        let content = fs::read_to_string(path).map_err(|e| SizeError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let sizes: BTreeMap<Digest, i64> =
            serde_json::from_str(&content).map_err(|e| SizeError::File {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self::new(sizes.into_iter().collect()))
    }

    /// The underlying table.
    pub fn sizes(&self) -> &DigestSizes {
        &self.sizes
    }
}

#[async_trait]
impl SizeLookup for StaticSizes {
    async fn image_size(&self, edge: &PromotionEdge) -> Result<i64, SizeError> {
        Ok(self.sizes.get(&edge.digest).copied().unwrap_or(0))
    }
}

/// Resolve the size of every unique digest in `edges`.
///
/// Each digest is looked up once, through the first edge (in set order)
/// that references it. `concurrency` is clamped to at least one.
///
/// # Errors
///
/// Returns the first lookup error after all in-flight lookups complete.
pub async fn fetch_sizes(
    lookup: Arc<dyn SizeLookup>,
    edges: &EdgeSet,
    concurrency: usize,
) -> Result<DigestSizes, SizeError> {
    let concurrency = concurrency.max(1);

    let mut pending: BTreeMap<&Digest, &PromotionEdge> = BTreeMap::new();
    for edge in edges {
        pending.entry(&edge.digest).or_insert(edge);
    }
    let mut queue = pending.into_values();

    let mut tasks = JoinSet::new();
    let mut sizes = DigestSizes::new();
    let mut first_error: Option<SizeError> = None;

    loop {
        while first_error.is_none() && tasks.len() < concurrency {
            let Some(edge) = queue.next() else { break };
            let edge = edge.clone();
            let lookup = Arc::clone(&lookup);
            tasks.spawn(async move {
                let size = lookup.image_size(&edge).await;
                (edge.digest, size)
            });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };

        match joined {
            Ok((digest, Ok(size))) => {
                sizes.insert(digest, size);
            }
            Ok((_, Err(e))) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(SizeError::TaskFailed(e.to_string()));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(sizes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::RegistryContext;
    use crate::core::types::{ImageName, RegistryName, Tag};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn edge(image: &str, digest: &str, tag: Option<&str>) -> PromotionEdge {
        PromotionEdge {
            image_name: ImageName::new(image).unwrap(),
            digest: Digest::new(digest).unwrap(),
            tag: tag.map(|t| Tag::new(t).unwrap()),
            src_registry: RegistryContext::source(RegistryName::new("gcr.io/foo").unwrap(), ""),
            dst_registry: RegistryContext::destination(
                RegistryName::new("gcr.io/bar").unwrap(),
                "",
            ),
        }
    }

    fn digest(s: &str) -> Digest {
        Digest::new(s).unwrap()
    }

    /// Records peak concurrency and lookup calls; fails on configured digests.
    #[derive(Default)]
    struct RecordingLookup {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl SizeLookup for RecordingLookup {
        async fn image_size(&self, edge: &PromotionEdge) -> Result<i64, SizeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(edge.digest.to_string());

            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.as_deref() == Some(edge.digest.as_str()) {
                return Err(SizeError::NotFound(edge.digest.to_string()));
            }
            Ok(edge.digest.encoded().len() as i64)
        }
    }

    #[tokio::test]
    async fn looks_up_each_digest_once() {
        let edges = EdgeSet::from([
            edge("a", "sha256:000", Some("1.0")),
            edge("a", "sha256:000", Some("latest")),
            edge("b", "sha256:1111", None),
        ]);
        let lookup = Arc::new(RecordingLookup::default());

        let sizes = fetch_sizes(lookup.clone(), &edges, 4).await.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[&digest("sha256:000")], 3);
        assert_eq!(sizes[&digest("sha256:1111")], 4);
        assert_eq!(lookup.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn respects_concurrency_bound() {
        let edges: EdgeSet = (0..20)
            .map(|i| edge("a", &format!("sha256:{i:03}"), None))
            .collect();
        let lookup = Arc::new(RecordingLookup::default());

        let sizes = fetch_sizes(lookup.clone(), &edges, 3).await.unwrap();
        assert_eq!(sizes.len(), 20);
        assert!(lookup.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped() {
        let edges = EdgeSet::from([edge("a", "sha256:000", None)]);
        let lookup = Arc::new(RecordingLookup::default());
        let sizes = fetch_sizes(lookup, &edges, 0).await.unwrap();
        assert_eq!(sizes.len(), 1);
    }

    #[tokio::test]
    async fn first_error_stops_new_lookups() {
        let edges: EdgeSet = (0..10)
            .map(|i| edge("a", &format!("sha256:{i:03}"), None))
            .collect();
        let lookup = Arc::new(RecordingLookup {
            fail_on: Some("sha256:000".to_string()),
            ..RecordingLookup::default()
        });

        let err = fetch_sizes(lookup.clone(), &edges, 1).await.unwrap_err();
        assert_eq!(err, SizeError::NotFound("sha256:000".to_string()));
        // Digests are visited in sorted order; the failing one is first.
        assert_eq!(lookup.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn static_sizes_report_missing_digests_as_zero() {
        let lookup = StaticSizes::new(DigestSizes::from([(digest("sha256:000"), 10)]));
        assert_eq!(
            lookup.image_size(&edge("a", "sha256:000", None)).await,
            Ok(10)
        );
        assert_eq!(
            lookup.image_size(&edge("a", "sha256:111", None)).await,
            Ok(0)
        );
    }

    #[tokio::test]
    async fn fetched_and_direct_tables_agree_on_missing_digests() {
        use crate::checks::ImageSizeCheck;

        let edges = EdgeSet::from([edge("a", "sha256:000", None), edge("b", "sha256:111", None)]);
        let table = DigestSizes::from([(digest("sha256:000"), 10)]);

        let fetched = fetch_sizes(Arc::new(StaticSizes::new(table.clone())), &edges, 2)
            .await
            .unwrap();
        let via_fetch = ImageSizeCheck::new(1)
            .with_edges(edges.clone())
            .with_sizes(fetched)
            .check_sizes();
        let direct = ImageSizeCheck::new(1)
            .with_edges(edges)
            .with_sizes(table)
            .check_sizes();

        assert_eq!(via_fetch, direct);
        assert!(via_fetch.unwrap_err().invalid.contains_key(&ImageName::new("b").unwrap()));
    }

    #[test]
    fn static_sizes_load_from_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sizes.json");
        fs::write(&path, r#"{"sha256:000": 1000000, "sha256:111": -1}"#).unwrap();

        let lookup = StaticSizes::from_json_file(&path).unwrap();
        assert_eq!(lookup.sizes()[&digest("sha256:000")], 1_000_000);
        assert_eq!(lookup.sizes()[&digest("sha256:111")], -1);
    }

    #[test]
    fn static_sizes_reject_bad_digest_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sizes.json");
        fs::write(&path, r#"{"000": 1}"#).unwrap();

        let err = StaticSizes::from_json_file(&path).unwrap_err();
        assert!(matches!(err, SizeError::File { .. }));
    }
}
