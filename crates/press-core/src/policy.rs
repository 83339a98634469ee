//! Whether an existing artifact may be served without rebuilding.
//!
//! | Strategy | Artifact exists | Artifact absent |
//! |----------|-----------------|-----------------|
//! | `Always` | reuse           | build           |
//! | `Never`  | build           | build           |
//! | `Change` | reuse           | build           |
//!
//! Under `Change` the artifact name embeds the content fingerprint, so
//! existence already proves the content matches. There is no TTL and no
//! checksum comparison beyond what the name encodes.

use crate::error::PressResult;
use crate::handle::ArtifactHandle;
use crate::types::CachingStrategy;

pub fn decide(strategy: CachingStrategy, artifact_exists: bool) -> bool {
    match strategy {
        CachingStrategy::Always | CachingStrategy::Change => artifact_exists,
        CachingStrategy::Never => false,
    }
}

/// Storage is not consulted under `Never`.
pub async fn use_cached_artifact(
    strategy: CachingStrategy,
    handle: &ArtifactHandle,
) -> PressResult<bool> {
    if strategy == CachingStrategy::Never {
        return Ok(false);
    }
    Ok(decide(strategy, handle.exists().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn decision_table() {
        use CachingStrategy::*;
        assert!(decide(Always, true));
        assert!(!decide(Always, false));
        assert!(!decide(Never, true));
        assert!(!decide(Never, false));
        assert!(decide(Change, true));
        assert!(!decide(Change, false));
    }

    #[tokio::test]
    async fn existing_artifact() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write_atomic(Path::new("js/a.js"), b"x")
            .await
            .unwrap();
        let handle = ArtifactHandle::new(storage, "js", "a.js");

        assert!(use_cached_artifact(CachingStrategy::Always, &handle)
            .await
            .unwrap());
        assert!(use_cached_artifact(CachingStrategy::Change, &handle)
            .await
            .unwrap());
        assert!(!use_cached_artifact(CachingStrategy::Never, &handle)
            .await
            .unwrap());
    }
}
