//! Error types shared across the crossenv workspace.

use crate::artifact::Sha256Digest;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crossenv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for crossenv operations.
///
/// The taxonomy is deliberately small: `Config` means the caller's input is
/// wrong and retrying cannot help, `Fetch` and `Timeout` are transport
/// failures that are safe to retry, and `Integrity` means the downloaded
/// bytes do not match the pinned digest and the pin itself must be fixed.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown profile or invalid descriptor data.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or transport failure while downloading an artifact.
    #[error("fetch failed for '{artifact}': {message}")]
    Fetch {
        /// Name of the artifact being downloaded.
        artifact: String,
        /// Transport-level failure description.
        message: String,
    },

    /// Download exceeded the caller-supplied deadline.
    #[error("fetch of '{artifact}' timed out after {seconds}s")]
    Timeout {
        /// Name of the artifact being downloaded.
        artifact: String,
        /// The deadline that was exceeded.
        seconds: u64,
    },

    /// Downloaded bytes do not match the pinned digest.
    #[error(
        "integrity check failed for '{artifact}': expected {expected}, computed {computed}"
    )]
    Integrity {
        /// Name of the artifact that failed verification.
        artifact: String,
        /// The digest the descriptor pins.
        expected: Sha256Digest,
        /// The digest computed over the downloaded bytes.
        computed: Sha256Digest,
    },

    /// Filesystem operation failed.
    #[error("I/O {operation} failed on {}: {source}", path.as_deref().unwrap_or_else(|| std::path::Path::new("<unknown>")).display())]
    Io {
        /// The underlying I/O error.
        source: std::io::Error,
        /// Path the operation was acting on, when known.
        path: Option<PathBuf>,
        /// Short verb naming the operation (`create`, `rename`, `unpack`, ...).
        operation: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a fetch error for the named artifact.
    pub fn fetch(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error for the named artifact.
    pub fn timeout(artifact: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            artifact: artifact.into(),
            seconds,
        }
    }

    /// Create an integrity error for the named artifact.
    pub fn integrity(
        artifact: impl Into<String>,
        expected: Sha256Digest,
        computed: Sha256Digest,
    ) -> Self {
        Self::Integrity {
            artifact: artifact.into(),
            expected,
            computed,
        }
    }

    /// Create an I/O error with path and operation context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }

    /// Whether re-invoking the failed operation can succeed without the
    /// caller changing anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Timeout { .. })
    }
}
