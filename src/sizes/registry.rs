//! sizes::registry
//!
//! Image size lookups against an OCI distribution registry.
//!
//! # Protocol
//!
//! The size of an image is the sum of its config blob and layer sizes, as
//! declared by the image manifest at:
//!
//! ```text
//! GET {scheme}://{host}/v2/{prefix}/{image}/manifests/{digest}
//! ```
//!
//! For a manifest list (multi-arch index) the reported size is the largest
//! child image, fetched one level deep.
//!
//! Requests are anonymous; registries requiring authentication will
//! answer with an HTTP error, which is surfaced as [`SizeError::Http`].

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{SizeError, SizeLookup};
use crate::core::edges::PromotionEdge;
use crate::core::types::{Digest, ImageName, RegistryName};

/// Media types accepted when fetching manifests.
const MANIFEST_MEDIA_TYPES: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

/// Content descriptor as it appears in manifests.
#[derive(Debug, Deserialize)]
struct Descriptor {
    size: i64,
    #[serde(default)]
    digest: Option<String>,
}

/// The subset of an image manifest or index needed to compute size.
#[derive(Debug, Deserialize)]
struct RegistryManifest {
    #[serde(default)]
    config: Option<Descriptor>,
    #[serde(default)]
    layers: Vec<Descriptor>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

impl RegistryManifest {
    fn is_index(&self) -> bool {
        self.config.is_none() && !self.manifests.is_empty()
    }

    fn image_size(&self) -> i64 {
        let config = self.config.as_ref().map_or(0, |c| c.size);
        self.layers.iter().fold(config, |acc, layer| acc.saturating_add(layer.size))
    }
}

/// Size lookup that queries the edge's source registry.
#[derive(Debug, Clone)]
pub struct RegistrySizeLookup {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl Default for RegistrySizeLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrySizeLookup {
    /// Create a lookup that talks HTTPS to each registry host.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
        }
    }

    /// Send every request to `endpoint` instead of the registry host.
    ///
    /// The registry prefix is still part of the path. Used for mirrors and
    /// for tests against a local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    /// Manifest URL for an image digest in a registry.
    pub fn manifest_url(&self, registry: &RegistryName, image: &ImageName, reference: &str) -> String {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}", registry.host()),
        };
        let repository = match registry.prefix() {
            Some(prefix) => format!("{prefix}/{image}"),
            None => image.to_string(),
        };
        format!("{base}/v2/{repository}/manifests/{reference}")
    }

    async fn fetch_manifest(&self, url: &str) -> Result<RegistryManifest, SizeError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, MANIFEST_MEDIA_TYPES)
            .send()
            .await
            .map_err(|e| SizeError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SizeError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(SizeError::Http {
                reference: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<RegistryManifest>()
            .await
            .map_err(|e| SizeError::InvalidResponse {
                reference: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl SizeLookup for RegistrySizeLookup {
    async fn image_size(&self, edge: &PromotionEdge) -> Result<i64, SizeError> {
        let registry = &edge.src_registry.name;
        let url = self.manifest_url(registry, &edge.image_name, edge.digest.as_str());
        let manifest = self.fetch_manifest(&url).await?;

        if !manifest.is_index() {
            return Ok(manifest.image_size());
        }

        let mut largest = 0;
        for child in &manifest.manifests {
            let Some(child_digest) = child.digest.as_deref() else {
                return Err(SizeError::InvalidResponse {
                    reference: url,
                    message: "index entry without digest".to_string(),
                });
            };
            let child_digest = Digest::new(child_digest).map_err(|e| SizeError::InvalidResponse {
                reference: url.clone(),
                message: e.to_string(),
            })?;
            let child_url = self.manifest_url(registry, &edge.image_name, child_digest.as_str());
            let child_manifest = self.fetch_manifest(&child_url).await?;
            largest = largest.max(child_manifest.image_size());
        }
        Ok(largest)
    }
}
