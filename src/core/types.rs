//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RegistryName`] - Registry location (host plus path prefix)
//! - [`ImageName`] - Logical image name within a registry
//! - [`Digest`] - Content-addressed artifact identifier
//! - [`Tag`] - Mutable human-readable label bound to a digest
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so manifests that reach the edge deriver are
//! already well-formed at the field level.
//!
//! # Examples
//!
//! ```
//! use imagepromoter::core::types::{Digest, RegistryName, Tag};
//!
//! let registry = RegistryName::new("gcr.io/foo").unwrap();
//! let digest = Digest::new("sha256:000").unwrap();
//! let tag = Tag::new("0.9").unwrap();
//!
//! assert_eq!(registry.host(), "gcr.io");
//! assert_eq!(digest.algorithm(), "sha256");
//! assert_eq!(tag.as_str(), "0.9");
//!
//! assert!(Digest::new("not-a-digest").is_err());
//! assert!(Tag::new("-latest").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid registry name: {0}")]
    InvalidRegistryName(String),

    #[error("invalid image name: {0}")]
    InvalidImageName(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),
}

/// Number of bytes in one (decimal) megabyte.
pub const BYTES_PER_MB: i64 = 1_000_000;

/// Convert decimal megabytes to bytes.
///
/// ```
/// use imagepromoter::core::types::mb_to_bytes;
///
/// assert_eq!(mb_to_bytes(1), 1_000_000);
/// assert_eq!(mb_to_bytes(-5), -5_000_000);
/// ```
pub fn mb_to_bytes(mb: i64) -> i64 {
    mb.saturating_mul(BYTES_PER_MB)
}

/// Convert bytes to decimal megabytes, rounding down.
pub fn bytes_to_mb(bytes: i64) -> i64 {
    bytes / BYTES_PER_MB
}

/// Generates the string plumbing shared by every name newtype.
macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            /// Get the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Shared rule for names: non-empty and free of whitespace/control chars.
fn check_plain(value: &str, what: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_ascii_control())
    {
        return Err(format!("{what} cannot contain whitespace: {value:?}"));
    }
    Ok(())
}

/// A registry location such as `gcr.io/foo`.
///
/// The first path component is the registry host; anything after it is a
/// repository prefix under which images live.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryName(String);

impl RegistryName {
    /// Create a new validated registry name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRegistryName` if the name is empty,
    /// contains whitespace, or has a leading/trailing `/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_plain(&name, "registry name").map_err(TypeError::InvalidRegistryName)?;
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidRegistryName(format!(
                "registry name cannot start or end with '/': {name}"
            )));
        }
        Ok(Self(name))
    }

    /// The registry host (everything before the first `/`).
    pub fn host(&self) -> &str {
        self.0.split_once('/').map_or(&self.0, |(host, _)| host)
    }

    /// The repository prefix under the host, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, prefix)| prefix)
    }
}

string_newtype!(RegistryName);

/// A logical image name, e.g. `kube-apiserver` or `addons/dns`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageName(String);

impl ImageName {
    /// Create a new validated image name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidImageName` if the name is empty, contains
    /// whitespace, or has a leading/trailing `/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_plain(&name, "image name").map_err(TypeError::InvalidImageName)?;
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidImageName(format!(
                "image name cannot start or end with '/': {name}"
            )));
        }
        Ok(Self(name))
    }
}

string_newtype!(ImageName);

/// A content-addressed digest in `<algorithm>:<encoded>` form.
///
/// Digests are compared exactly; no case normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Create a new validated digest.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDigest` if the value is not of the form
    /// `<algorithm>:<encoded>`.
    pub fn new(digest: impl Into<String>) -> Result<Self, TypeError> {
        let digest = digest.into();
        let Some((algorithm, encoded)) = digest.split_once(':') else {
            return Err(TypeError::InvalidDigest(format!(
                "missing algorithm prefix: {digest}"
            )));
        };

        let algorithm_ok = !algorithm.is_empty()
            && algorithm
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+._-".contains(c));
        if !algorithm_ok {
            return Err(TypeError::InvalidDigest(format!(
                "invalid algorithm '{algorithm}' in {digest}"
            )));
        }

        let encoded_ok = !encoded.is_empty()
            && encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "=_-".contains(c));
        if !encoded_ok {
            return Err(TypeError::InvalidDigest(format!(
                "invalid encoded part in {digest}"
            )));
        }

        Ok(Self(digest))
    }

    /// The algorithm prefix, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map_or("", |(algorithm, _)| algorithm)
    }

    /// The encoded hash after the algorithm prefix.
    pub fn encoded(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, encoded)| encoded)
    }
}

string_newtype!(Digest);

/// A mutable label bound to one digest of an image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Maximum tag length accepted by OCI registries.
    pub const MAX_LEN: usize = 128;

    /// Create a new validated tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if the tag is empty, too long, starts
    /// with `.` or `-`, or contains characters outside `[A-Za-z0-9_.-]`.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TypeError::InvalidTag("tag cannot be empty".into()));
        }
        if tag.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidTag(format!(
                "tag longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if tag.starts_with('.') || tag.starts_with('-') {
            return Err(TypeError::InvalidTag(format!(
                "tag cannot start with '.' or '-': {tag}"
            )));
        }
        if let Some(c) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "_.-".contains(*c)))
        {
            return Err(TypeError::InvalidTag(format!(
                "tag cannot contain '{c}': {tag}"
            )));
        }
        Ok(Self(tag))
    }
}

string_newtype!(Tag);

#[cfg(test)]
mod tests {
    use super::*;

    mod registry_name {
        use super::*;

        #[test]
        fn splits_host_and_prefix() {
            let name = RegistryName::new("gcr.io/foo/bar").unwrap();
            assert_eq!(name.host(), "gcr.io");
            assert_eq!(name.prefix(), Some("foo/bar"));
        }

        #[test]
        fn bare_host_has_no_prefix() {
            let name = RegistryName::new("registry.local:5000").unwrap();
            assert_eq!(name.host(), "registry.local:5000");
            assert_eq!(name.prefix(), None);
        }

        #[test]
        fn rejects_empty_and_slashes() {
            assert!(RegistryName::new("").is_err());
            assert!(RegistryName::new("gcr.io/foo/").is_err());
            assert!(RegistryName::new("/gcr.io").is_err());
            assert!(RegistryName::new("gcr.io/ foo").is_err());
        }
    }

    mod digest {
        use super::*;

        #[test]
        fn accepts_short_test_digests() {
            let digest = Digest::new("sha256:000").unwrap();
            assert_eq!(digest.algorithm(), "sha256");
            assert_eq!(digest.encoded(), "000");
        }

        #[test]
        fn rejects_missing_parts() {
            assert!(Digest::new("sha256").is_err());
            assert!(Digest::new(":abc").is_err());
            assert!(Digest::new("sha256:").is_err());
            assert!(Digest::new("SHA256:abc").is_err());
            assert!(Digest::new("sha256:ab c").is_err());
        }

        #[test]
        fn serde_uses_plain_string() {
            let digest = Digest::new("sha256:abc").unwrap();
            let json = serde_json::to_string(&digest).unwrap();
            assert_eq!(json, "\"sha256:abc\"");

            let err = serde_json::from_str::<Digest>("\"abc\"");
            assert!(err.is_err());
        }
    }

    mod tag {
        use super::*;

        #[test]
        fn accepts_common_tags() {
            for tag in ["latest", "v1.2.3", "0.9", "build_42", "1.0-rc.1"] {
                assert!(Tag::new(tag).is_ok(), "{tag} should be valid");
            }
        }

        #[test]
        fn rejects_invalid_tags() {
            assert!(Tag::new("").is_err());
            assert!(Tag::new(".hidden").is_err());
            assert!(Tag::new("-dash").is_err());
            assert!(Tag::new("has/slash").is_err());
            assert!(Tag::new("a".repeat(129)).is_err());
        }
    }

    #[test]
    fn image_name_rejects_whitespace() {
        assert!(ImageName::new("kube apiserver").is_err());
        assert!(ImageName::new("addons/dns").is_ok());
    }

    #[test]
    fn megabyte_conversion_is_decimal() {
        assert_eq!(mb_to_bytes(1), 1_000_000);
        assert_eq!(bytes_to_mb(5_500_000), 5);
        assert_eq!(mb_to_bytes(i64::MAX), i64::MAX);
    }
}
