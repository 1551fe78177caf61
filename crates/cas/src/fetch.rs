//! Download, verify, and materialize pinned artifacts.

use crate::extract::unpack;
use crate::store::ArtifactStore;
use crossenv_core::artifact::{ArtifactDescriptor, FetchedArtifact, Sha256Digest};
use crossenv_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fetches descriptors into the content-addressed store.
///
/// All network traffic is bounded by the caller-supplied timeout. Fetches
/// of distinct artifacts are independent; a `Fetcher` can be shared across
/// concurrent fetch futures freely.
#[derive(Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    store: ArtifactStore,
    timeout: Duration,
}

impl Fetcher {
    /// Create a fetcher over the given store with a total per-request
    /// deadline.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be constructed.
    pub fn new(store: ArtifactStore, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crossenv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            store,
            timeout,
        })
    }

    /// The store this fetcher materializes into.
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Materialize a descriptor into the store.
    ///
    /// Idempotent: an existing store entry is returned without network
    /// traffic. Otherwise the archive is downloaded to a temporary file,
    /// its SHA-256 digest compared against the pin, and only a verified
    /// archive is extracted and promoted. A mismatching download is
    /// discarded without ever touching the store.
    ///
    /// # Errors
    ///
    /// `Error::Fetch`/`Error::Timeout` on transport failure (retryable),
    /// `Error::Integrity` on digest mismatch, `Error::Io` on store
    /// failures.
    pub async fn fetch(&self, descriptor: &ArtifactDescriptor) -> Result<FetchedArtifact> {
        if let Some(root) = self.store.lookup(descriptor) {
            debug!(artifact = %descriptor.name, "already in store");
            return Ok(materialized(descriptor, root));
        }

        info!(artifact = %descriptor.name, url = %descriptor.url, "downloading");
        let (download, computed) = self.download(descriptor).await?;

        if computed != descriptor.digest {
            // The temporary file is dropped here, so the corrupt download
            // never becomes visible.
            return Err(Error::integrity(
                &descriptor.name,
                descriptor.digest.clone(),
                computed,
            ));
        }

        let staging = self.store.begin_staging()?;
        unpack(&descriptor.archive, download.path(), staging.path())?;
        let root = self.store.promote(staging, descriptor)?;
        info!(artifact = %descriptor.name, root = %root.display(), "verified and promoted");
        Ok(materialized(descriptor, root))
    }

    /// Stream the archive to a temporary file, hashing as it arrives.
    async fn download(
        &self,
        descriptor: &ArtifactDescriptor,
    ) -> Result<(tempfile::NamedTempFile, Sha256Digest)> {
        let mut response = self
            .client
            .get(&descriptor.url)
            .send()
            .await
            .map_err(|e| self.transport_error(descriptor, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(
                &descriptor.name,
                format!("HTTP {status} from {}", descriptor.url),
            ));
        }

        let tmp = tempfile::NamedTempFile::new()
            .map_err(|e| Error::io(e, std::env::temp_dir(), "create download file"))?;
        let mut file = tokio::fs::File::create(tmp.path())
            .await
            .map_err(|e| Error::io(e, tmp.path(), "open download file"))?;

        let mut hasher = Sha256::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(descriptor, &e))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(e, tmp.path(), "write"))?;
        }
        file.flush()
            .await
            .map_err(|e| Error::io(e, tmp.path(), "flush"))?;
        drop(file);

        let computed = Sha256Digest::from_hex(hex::encode(hasher.finalize()))?;
        Ok((tmp, computed))
    }

    fn transport_error(&self, descriptor: &ArtifactDescriptor, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(&descriptor.name, self.timeout.as_secs())
        } else {
            Error::fetch(&descriptor.name, e.to_string())
        }
    }
}

fn materialized(descriptor: &ArtifactDescriptor, root: std::path::PathBuf) -> FetchedArtifact {
    FetchedArtifact {
        name: descriptor.name.clone(),
        version: descriptor.version.clone(),
        root,
        verified: true,
    }
}
