//! checks::removal
//!
//! Detects images that disappear between a trusted baseline and a proposal.
//!
//! # Semantics
//!
//! An image name is "removed" when it appears in the baseline and either
//! does not appear in the proposal at all, or shares no digest with it.
//! Overlap on a single digest is enough to keep the name, whatever its
//! tags or registries.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use super::{BaselineCheck, CheckError};
use crate::core::edges::EdgeSet;
use crate::core::types::{Digest, ImageName};

/// Images whose entire digest lineage vanished, sorted by name.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("The following images were removed in this pull request: {}", join_names(.removed))]
pub struct ImageRemovalError {
    pub removed: Vec<ImageName>,
}

fn join_names(names: &[ImageName]) -> String {
    names
        .iter()
        .map(ImageName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Baseline-comparison check guarding against silent image removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRemovalCheck;

impl ImageRemovalCheck {
    /// Compare a trusted baseline against a proposed edge set.
    ///
    /// # Errors
    ///
    /// Returns [`ImageRemovalError`] listing every removed image name.
    pub fn find_removed(
        &self,
        baseline: &EdgeSet,
        proposed: &EdgeSet,
    ) -> Result<(), ImageRemovalError> {
        let baseline_index = digests_by_image(baseline);
        let proposed_index = digests_by_image(proposed);

        let removed: BTreeSet<&ImageName> = baseline_index
            .iter()
            .filter(|(name, digests)| match proposed_index.get(*name) {
                None => true,
                Some(proposed_digests) => digests.is_disjoint(proposed_digests),
            })
            .map(|(name, _)| *name)
            .collect();

        if removed.is_empty() {
            Ok(())
        } else {
            Err(ImageRemovalError {
                removed: removed.into_iter().cloned().collect(),
            })
        }
    }
}

impl BaselineCheck for ImageRemovalCheck {
    fn name(&self) -> &'static str {
        "image-removal"
    }

    fn compare(&self, baseline: &EdgeSet, proposed: &EdgeSet) -> Result<(), CheckError> {
        self.find_removed(baseline, proposed).map_err(CheckError::from)
    }
}

fn digests_by_image(edges: &EdgeSet) -> HashMap<&ImageName, HashSet<&Digest>> {
    let mut index: HashMap<&ImageName, HashSet<&Digest>> = HashMap::new();
    for edge in edges {
        index.entry(&edge.image_name).or_default().insert(&edge.digest);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::edges::PromotionEdge;
    use crate::core::manifest::RegistryContext;
    use crate::core::types::{RegistryName, Tag};

    fn edge(image: &str, digest: &str, src: &str, tag: Option<&str>) -> PromotionEdge {
        PromotionEdge {
            image_name: ImageName::new(image).unwrap(),
            digest: Digest::new(digest).unwrap(),
            tag: tag.map(|t| Tag::new(t).unwrap()),
            src_registry: RegistryContext::source(RegistryName::new(src).unwrap(), "robot"),
            dst_registry: RegistryContext::destination(
                RegistryName::new("gcr.io/bar").unwrap(),
                "robot",
            ),
        }
    }

    #[test]
    fn empty_sets_pass() {
        let check = ImageRemovalCheck;
        assert_eq!(check.find_removed(&EdgeSet::new(), &EdgeSet::new()), Ok(()));
    }

    #[test]
    fn new_images_in_proposal_are_fine() {
        let baseline = EdgeSet::new();
        let proposed = EdgeSet::from([edge("a", "sha256:000", "gcr.io/foo", Some("0.9"))]);
        assert_eq!(ImageRemovalCheck.find_removed(&baseline, &proposed), Ok(()));
    }

    #[test]
    fn retag_and_reregistry_count_as_present() {
        let baseline = EdgeSet::from([edge("a", "sha256:000", "gcr.io/foo", Some("0.9"))]);
        let proposed = EdgeSet::from([edge("a", "sha256:000", "gcr.io/foo2", None)]);
        assert_eq!(ImageRemovalCheck.find_removed(&baseline, &proposed), Ok(()));
    }

    #[test]
    fn partial_digest_overlap_counts_as_present() {
        let baseline = EdgeSet::from([
            edge("a", "sha256:000", "gcr.io/foo", None),
            edge("a", "sha256:111", "gcr.io/foo", None),
        ]);
        let proposed = EdgeSet::from([edge("a", "sha256:111", "gcr.io/foo", None)]);
        assert_eq!(ImageRemovalCheck.find_removed(&baseline, &proposed), Ok(()));
    }

    #[test]
    fn removed_names_are_sorted() {
        let baseline = EdgeSet::from([
            edge("zeta", "sha256:000", "gcr.io/foo", None),
            edge("alpha", "sha256:111", "gcr.io/foo", None),
            edge("kept", "sha256:222", "gcr.io/foo", None),
        ]);
        let proposed = EdgeSet::from([edge("kept", "sha256:222", "gcr.io/foo", None)]);

        let err = ImageRemovalCheck
            .find_removed(&baseline, &proposed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following images were removed in this pull request: alpha, zeta"
        );
    }

    #[test]
    fn trait_wraps_error() {
        let baseline = EdgeSet::from([edge("a", "sha256:000", "gcr.io/foo", None)]);
        let err = ImageRemovalCheck
            .compare(&baseline, &EdgeSet::new())
            .unwrap_err();
        assert_eq!(
            err,
            CheckError::ImageRemoval(ImageRemovalError {
                removed: vec![ImageName::new("a").unwrap()],
            })
        );
    }
}
