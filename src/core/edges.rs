//! core::edges
//!
//! Promotion edge derivation.
//!
//! # Architecture
//!
//! A [`PromotionEdge`] is one atomic copy obligation:
//! `(image, digest, tag, source, destination)`. Edges are plain values with
//! no identity beyond their fields, and are collected into an [`EdgeSet`]
//! so identical contributions from several manifests collapse into one.
//!
//! [`derive_edges`] expands every manifest as:
//!
//! ```text
//! image × digest × (tag | untagged) × source × destination
//! ```
//!
//! # Invariants
//!
//! - The result is a true set, independent of manifest order or repetition
//! - A destination never coincides with the source feeding it
//! - Inputs are never mutated
//! - A malformed manifest fails the whole call; nothing is skipped

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use super::manifest::{Manifest, RegistryContext};
use super::types::{Digest, ImageName, RegistryName, Tag};

/// Errors from edge derivation. Each names the offending manifest by its
/// position in the input sequence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("manifest {index}: registry list is empty")]
    NoRegistries { index: usize },

    #[error("manifest {index}: no registry is flagged as source")]
    NoSourceRegistry { index: usize },

    #[error("manifest {index}: src_registry '{name}' is not a source registry in this manifest")]
    UnknownSourceRegistry { index: usize, name: RegistryName },

    #[error("manifest {index}: registry '{name}' is listed as both source and destination")]
    AmbiguousSource { index: usize, name: RegistryName },
}

/// The atomic unit of promotion work.
///
/// `tag` is `None` for a digest promoted without any tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PromotionEdge {
    pub image_name: ImageName,
    pub digest: Digest,
    pub tag: Option<Tag>,
    pub src_registry: RegistryContext,
    pub dst_registry: RegistryContext,
}

impl PromotionEdge {
    /// Fully qualified source reference, e.g. `gcr.io/foo/a@sha256:000`.
    pub fn src_reference(&self) -> String {
        format!("{}/{}@{}", self.src_registry.name, self.image_name, self.digest)
    }

    /// Fully qualified destination reference, with tag when present.
    pub fn dst_reference(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{}/{}:{}", self.dst_registry.name, self.image_name, tag),
            None => format!("{}/{}@{}", self.dst_registry.name, self.image_name, self.digest),
        }
    }
}

impl std::fmt::Display for PromotionEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = self.tag.as_ref().map_or("(untagged)", Tag::as_str);
        write!(
            f,
            "{} -> {} [{}]",
            self.src_reference(),
            self.dst_reference(),
            tag
        )
    }
}

/// Deduplicated, deterministically ordered set of edges.
pub type EdgeSet = BTreeSet<PromotionEdge>;

/// Derive the union of promotion edges for a batch of manifests.
///
/// # Errors
///
/// Returns a [`DeriveError`] for the first malformed manifest encountered.
///
/// # Example
///
/// ```
/// use imagepromoter::core::edges::derive_edges;
/// use imagepromoter::core::manifest::{Image, Manifest, RegistryContext};
/// use imagepromoter::core::types::{Digest, ImageName, RegistryName, Tag};
///
/// let src = RegistryContext::source(RegistryName::new("gcr.io/foo").unwrap(), "robot");
/// let dst = RegistryContext::destination(RegistryName::new("gcr.io/bar").unwrap(), "robot");
/// let image = Image::new(ImageName::new("a").unwrap())
///     .with_digest(Digest::new("sha256:000").unwrap(), [Tag::new("0.9").unwrap()]);
/// let manifest = Manifest::new(vec![dst, src], vec![image]);
///
/// let once = derive_edges(&[manifest.clone()]).unwrap();
/// let twice = derive_edges(&[manifest.clone(), manifest]).unwrap();
/// assert_eq!(once.len(), 1);
/// assert_eq!(once, twice);
/// ```
pub fn derive_edges(manifests: &[Manifest]) -> Result<EdgeSet, DeriveError> {
    let mut edges = EdgeSet::new();

    for (index, manifest) in manifests.iter().enumerate() {
        let sources = resolve_sources(index, manifest)?;
        let destinations: Vec<&RegistryContext> = manifest.destination_registries().collect();

        for image in &manifest.images {
            for (digest, tags) in &image.digests {
                let tags: Vec<Option<&Tag>> = if tags.is_empty() {
                    vec![None]
                } else {
                    tags.iter().map(Some).collect()
                };

                for tag in tags {
                    for src in &sources {
                        for dst in &destinations {
                            edges.insert(PromotionEdge {
                                image_name: image.name.clone(),
                                digest: digest.clone(),
                                tag: tag.cloned(),
                                src_registry: (*src).clone(),
                                dst_registry: (*dst).clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(edges)
}

/// Validate a manifest's registry list and pick the registries to promote from.
fn resolve_sources(index: usize, manifest: &Manifest) -> Result<Vec<&RegistryContext>, DeriveError> {
    if manifest.registries.is_empty() {
        return Err(DeriveError::NoRegistries { index });
    }

    let sources: Vec<&RegistryContext> = manifest.source_registries().collect();
    if sources.is_empty() {
        return Err(DeriveError::NoSourceRegistry { index });
    }

    if let Some(dst) = manifest
        .destination_registries()
        .find(|dst| sources.iter().any(|src| src.name == dst.name))
    {
        return Err(DeriveError::AmbiguousSource {
            index,
            name: dst.name.clone(),
        });
    }

    match &manifest.src_registry {
        None => Ok(sources),
        Some(name) => {
            let selected: Vec<&RegistryContext> =
                sources.into_iter().filter(|src| &src.name == name).collect();
            if selected.is_empty() {
                Err(DeriveError::UnknownSourceRegistry {
                    index,
                    name: name.clone(),
                })
            } else {
                Ok(selected)
            }
        }
    }
}
