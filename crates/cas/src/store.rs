//! The on-disk content-addressed artifact store.

use crossenv_core::artifact::ArtifactDescriptor;
use crossenv_core::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, trace};

/// Content-addressed store of extracted toolchain artifacts.
///
/// Default location: `~/.cache/crossenv/store`. Layout:
///
/// ```text
/// ~/.cache/crossenv/store/
/// ├── riscv-gnu-embedded-13.2.0-2-f26c49b756da/
/// │   └── xpack-riscv-none-elf-gcc-13.2.0-2/...
/// └── rust-analyzer-2024-06-10-5dc21c0ea491/
///     └── bin/rust-analyzer
/// ```
///
/// The digest in the entry name is the pin's digest, so re-pinning an
/// artifact lands in a fresh entry instead of mutating an existing one.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(default_root())
    }
}

impl ArtifactStore {
    /// Create a store at the given root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The store entry path for a descriptor.
    #[must_use]
    pub fn entry_path(&self, descriptor: &ArtifactDescriptor) -> PathBuf {
        self.root.join(format!(
            "{}-{}-{}",
            descriptor.name,
            descriptor.version,
            descriptor.digest.short()
        ))
    }

    /// Look up an existing entry; `None` means a fetch is required.
    #[must_use]
    pub fn lookup(&self, descriptor: &ArtifactDescriptor) -> Option<PathBuf> {
        let path = self.entry_path(descriptor);
        if path.is_dir() {
            trace!(artifact = %descriptor.name, ?path, "store hit");
            Some(path)
        } else {
            trace!(artifact = %descriptor.name, "store miss");
            None
        }
    }

    /// Create a staging directory inside the store root.
    ///
    /// Staging on the same filesystem keeps the later promotion a pure
    /// rename. The directory's dot-prefixed name keeps `list` from seeing
    /// half-extracted entries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the store root cannot be created or the
    /// staging directory cannot be allocated.
    pub fn begin_staging(&self) -> Result<TempDir> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| Error::io(e, self.root.clone(), "create_dir_all"))?;
        tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|e| Error::io(e, self.root.clone(), "create staging dir"))
    }

    /// Atomically promote a staged extraction into the store.
    ///
    /// If an entry for the descriptor already exists - including one that
    /// appeared while this extraction was running - the staged directory is
    /// discarded and the existing entry returned: losing the race is a
    /// cache hit, never an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the rename fails for any reason other than
    /// a concurrent winner.
    pub fn promote(&self, staged: TempDir, descriptor: &ArtifactDescriptor) -> Result<PathBuf> {
        let dest = self.entry_path(descriptor);
        if dest.is_dir() {
            debug!(artifact = %descriptor.name, ?dest, "entry appeared concurrently, discarding staging");
            return Ok(dest);
        }

        let staged = staged.keep();
        match std::fs::rename(&staged, &dest) {
            Ok(()) => {
                debug!(artifact = %descriptor.name, ?dest, "promoted store entry");
                Ok(dest)
            }
            Err(e) if dest.is_dir() => {
                // Lost the rename race; the winner's entry is already
                // verified and immutable.
                trace!(artifact = %descriptor.name, error = %e, "lost promotion race");
                let _ = std::fs::remove_dir_all(&staged);
                Ok(dest)
            }
            Err(e) => {
                let _ = std::fs::remove_dir_all(&staged);
                Err(Error::io(e, dest, "rename"))
            }
        }
    }

    /// Names of all promoted entries, sorted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the store root exists but cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        let dir = std::fs::read_dir(&self.root)
            .map_err(|e| Error::io(e, self.root.clone(), "read_dir"))?;
        for entry in dir {
            let entry = entry.map_err(|e| Error::io(e, self.root.clone(), "read_dir"))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && !name.starts_with('.') {
                entries.push(name);
            }
        }
        entries.sort_unstable();
        Ok(entries)
    }
}

/// The default store root: `~/.cache/crossenv/store`.
#[must_use]
pub fn default_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("crossenv")
        .join("store")
}
