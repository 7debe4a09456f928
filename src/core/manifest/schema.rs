//! core::manifest::schema
//!
//! Manifest value types.
//!
//! # Shape
//!
//! A manifest declares desired end-state for one promotion unit:
//!
//! ```toml
//! src_registry = "gcr.io/foo"   # optional
//!
//! [[registries]]
//! name = "gcr.io/foo"
//! service_account = "robot"
//! src = true
//!
//! [[registries]]
//! name = "gcr.io/bar"
//! service_account = "robot"
//!
//! [[images]]
//! name = "a"
//! [images.dmap]
//! "sha256:000" = ["0.9"]
//! ```
//!
//! These types carry no behavior beyond construction and lookup. Edge
//! derivation lives in [`crate::core::edges`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{Digest, ImageName, RegistryName, Tag};

/// Mapping from digest to the set of tags it carries.
///
/// An empty tag set is legal and still yields an untagged promotion.
pub type DigestTags = BTreeMap<Digest, BTreeSet<Tag>>;

/// One registry participating in a promotion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryContext {
    /// Registry location
    pub name: RegistryName,

    /// Service account used when talking to this registry
    #[serde(default)]
    pub service_account: String,

    /// Whether this registry is an authoritative source
    #[serde(default, rename = "src")]
    pub is_source: bool,
}

impl RegistryContext {
    /// Create a source registry entry.
    pub fn source(name: RegistryName, service_account: impl Into<String>) -> Self {
        Self {
            name,
            service_account: service_account.into(),
            is_source: true,
        }
    }

    /// Create a destination registry entry.
    pub fn destination(name: RegistryName, service_account: impl Into<String>) -> Self {
        Self {
            name,
            service_account: service_account.into(),
            is_source: false,
        }
    }
}

/// Every digest/tag known for one logical image name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
    /// Image name, relative to each registry
    pub name: ImageName,

    /// Digests and their tags
    #[serde(default, rename = "dmap")]
    pub digests: DigestTags,
}

impl Image {
    /// Create an image with no digests.
    pub fn new(name: ImageName) -> Self {
        Self {
            name,
            digests: DigestTags::new(),
        }
    }

    /// Add a digest with the given tags (builder style).
    pub fn with_digest(mut self, digest: Digest, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.digests.entry(digest).or_default().extend(tags);
        self
    }
}

/// Desired promotion state for one promotion unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Registries in declaration order; sources are flagged with `src`
    #[serde(default)]
    pub registries: Vec<RegistryContext>,

    /// Images in declaration order
    #[serde(default)]
    pub images: Vec<Image>,

    /// Selects one source-flagged registry to promote from.
    ///
    /// When unset, every source-flagged registry is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_registry: Option<RegistryName>,
}

impl Manifest {
    /// Create a manifest over the given registries and images.
    pub fn new(registries: Vec<RegistryContext>, images: Vec<Image>) -> Self {
        Self {
            registries,
            images,
            src_registry: None,
        }
    }

    /// Pin this manifest to one source registry (builder style).
    pub fn with_src_registry(mut self, name: RegistryName) -> Self {
        self.src_registry = Some(name);
        self
    }

    /// Registries flagged as sources.
    pub fn source_registries(&self) -> impl Iterator<Item = &RegistryContext> {
        self.registries.iter().filter(|rc| rc.is_source)
    }

    /// Registries not flagged as sources.
    pub fn destination_registries(&self) -> impl Iterator<Item = &RegistryContext> {
        self.registries.iter().filter(|rc| !rc.is_source)
    }
}
