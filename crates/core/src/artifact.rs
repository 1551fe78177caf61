//! Artifact descriptors: the static records the registry is built from.

use crate::platform::PlatformMatcher;
use crate::registry::Profile;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A SHA-256 digest as a 64-character lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Compute the digest of a byte slice.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Create from a hex string, validating length and alphabet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the string is not 64 lowercase hex digits.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let s = hex.into();
        if s.len() != 64 {
            return Err(Error::config(format!(
                "digest must be 64 hex characters, got {}",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            return Err(Error::config(
                "digest must contain only lowercase hex digits",
            ));
        }
        Ok(Self(s))
    }

    /// The full hex representation.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// A 12-character prefix, used in store entry names.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire format of a pinned artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum ArchiveKind {
    /// A gzip-compressed tarball.
    TarGz,
    /// A zip archive.
    Zip,
    /// A gzip-compressed single executable, placed at `bin/<file_name>`
    /// inside the store entry.
    GzipBinary {
        /// Name the decompressed executable is given.
        file_name: String,
    },
}

/// Value half of a `Set` environment rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValueTemplate {
    /// A fixed string.
    Literal(String),
    /// A path relative to the artifact's extracted root, resolved at
    /// composition time.
    StorePath {
        /// The relative path inside the store entry.
        path: String,
    },
}

impl EnvValueTemplate {
    /// Resolve the template against an artifact root.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::StorePath { path } => root.join(path).to_string_lossy().into_owned(),
        }
    }

    /// Whether resolving this template requires an artifact root.
    #[must_use]
    pub fn needs_root(&self) -> bool {
        matches!(self, Self::StorePath { .. })
    }
}

/// One environment-variable override contributed by an artifact or profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum EnvRule {
    /// Export a variable.
    Set {
        /// Variable name.
        name: String,
        /// Value template.
        value: EnvValueTemplate,
    },
    /// Remove a variable from the environment.
    Unset {
        /// Variable name.
        name: String,
    },
}

impl EnvRule {
    /// Shorthand for a literal `Set` rule.
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            name: name.into(),
            value: EnvValueTemplate::Literal(value.into()),
        }
    }

    /// Shorthand for a `Set` rule whose value is a path inside the
    /// artifact's store entry.
    pub fn set_store_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Set {
            name: name.into(),
            value: EnvValueTemplate::StorePath { path: path.into() },
        }
    }

    /// Shorthand for an `Unset` rule.
    pub fn unset(name: impl Into<String>) -> Self {
        Self::Unset { name: name.into() }
    }
}

/// A pinned, platform-conditional toolchain artifact.
///
/// Descriptors are immutable: they are created when the registry is built
/// and never change afterwards. One logical artifact that ships different
/// tarballs per host platform is registered as several descriptors sharing
/// a name, each with an `Exact` matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Artifact name, e.g. `riscv-gnu-embedded`.
    pub name: String,
    /// Upstream version string.
    pub version: String,
    /// Download URL for the pinned archive.
    pub url: String,
    /// Expected SHA-256 digest of the archive bytes.
    pub digest: Sha256Digest,
    /// Host platforms this descriptor applies to.
    pub matcher: PlatformMatcher,
    /// How the archive is unpacked.
    pub archive: ArchiveKind,
    /// Profiles that include this artifact.
    pub profiles: Vec<Profile>,
    /// Executable directories inside the extracted tree, in precedence
    /// order, relative to the store entry root.
    pub bin_dirs: Vec<String>,
    /// Environment overrides this artifact contributes.
    pub env_rules: Vec<EnvRule>,
}

/// An artifact materialized in the local store.
///
/// Values of this type only exist after a successful digest check, so
/// `verified` is true for every instance the fetch layer hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedArtifact {
    /// Name of the fetched artifact.
    pub name: String,
    /// Version of the fetched artifact.
    pub version: String,
    /// Root of the extracted store entry.
    pub root: PathBuf,
    /// Digest verification outcome; always true for promoted entries.
    pub verified: bool,
}
