use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{PressError, PressResult};
use crate::fingerprint::Fingerprint;
use crate::storage::Storage;

/// Locator for one artifact in the artifact storage.
///
/// Nothing is read until [`ArtifactHandle::read`] is called.
#[derive(Clone)]
pub struct ArtifactHandle {
    storage: Arc<dyn Storage>,
    dir: PathBuf,
    name: String,
}

impl ArtifactHandle {
    pub fn new(storage: Arc<dyn Storage>, dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            storage,
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Handle whose name is derived from `fingerprint` alone.
    pub fn for_fingerprint(
        storage: Arc<dyn Storage>,
        dir: impl Into<PathBuf>,
        fingerprint: &Fingerprint,
        extension: &str,
    ) -> Self {
        Self::new(storage, dir, fingerprint.artifact_name(extension))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path relative to the artifact storage root.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn exists(&self) -> PressResult<bool> {
        self.storage
            .exists(&self.path())
            .await
            .map_err(|e| PressError::Storage {
                message: format!("failed to stat {}: {}", self.path().display(), e),
            })
    }

    pub async fn read(&self) -> PressResult<Vec<u8>> {
        self.storage
            .read(&self.path())
            .await
            .map_err(|e| PressError::Storage {
                message: format!("failed to read {}: {}", self.path().display(), e),
            })
    }

    pub async fn modified(&self) -> PressResult<DateTime<Utc>> {
        self.storage
            .modified(&self.path())
            .await
            .map_err(|e| PressError::Storage {
                message: format!("failed to stat {}: {}", self.path().display(), e),
            })
    }
}

impl fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("dir", &self.dir)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for ArtifactHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage) && self.path() == other.path()
    }
}
