//! Top-level bundling pipeline for one asset kind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compressor::{
    self, AssetCompressor, GroupSources, ScriptCompressor, StyleCompressor,
};
use crate::config::PressConfig;
use crate::error::{PressError, PressResult};
use crate::fingerprint::Fingerprint;
use crate::handle::ArtifactHandle;
use crate::policy;
use crate::registry::{KeyRegistry, SweeperHandle};
use crate::static_groups::StaticGroups;
use crate::storage::{FsStorage, Storage};
use crate::types::{AssetKind, CacheKey, CachingStrategy, FileGroup, SourceFileRef};
use crate::writer::ArtifactWriter;

pub type ScriptBundleManager = BundleManager<ScriptCompressor>;
pub type StyleBundleManager = BundleManager<StyleCompressor>;

/// Resolves keys to file groups and groups to artifacts.
///
/// Cheap to share behind an `Arc`; all state is internally synchronised.
#[derive(Debug)]
pub struct BundleManager<C: AssetCompressor> {
    compressor: Arc<C>,
    config: Arc<PressConfig>,
    source: Arc<dyn Storage>,
    artifacts: Arc<dyn Storage>,
    registry: KeyRegistry,
    writer: ArtifactWriter,
    statics: StaticGroups,
    sweeper: Option<SweeperHandle>,
}

impl<C: AssetCompressor> BundleManager<C> {
    /// Filesystem storages rooted at the configured roots, and a private
    /// registry. Inside a tokio runtime the registry is also swept every
    /// `sweep_interval` until the manager is dropped or shut down.
    pub fn from_config(config: PressConfig, compressor: C) -> Self {
        let source: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.source_root));
        let artifacts: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.artifact_root));
        let registry = KeyRegistry::new(config.key_retention());
        let sweeper = tokio::runtime::Handle::try_current()
            .is_ok()
            .then(|| registry.spawn_sweeper(config.sweep_interval()));
        if sweeper.is_none() {
            debug!("no tokio runtime; registry relies on lazy sweeps");
        }

        let mut manager =
            Self::with_components(Arc::new(config), compressor, source, artifacts, registry);
        manager.sweeper = sweeper;
        manager
    }

    /// Share `registry` between managers of different kinds so one page
    /// render can register both its scripts and its styles. The caller owns
    /// the registry's sweeper.
    pub fn with_components(
        config: Arc<PressConfig>,
        compressor: C,
        source: Arc<dyn Storage>,
        artifacts: Arc<dyn Storage>,
        registry: KeyRegistry,
    ) -> Self {
        let statics = StaticGroups::new(Arc::clone(&source), config.static_config_dir.clone());
        Self {
            compressor: Arc::new(compressor),
            config,
            source,
            artifacts,
            registry,
            writer: ArtifactWriter::new(),
            statics,
            sweeper: None,
        }
    }

    /// Stop the background sweeper, if this manager started one.
    pub async fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown().await;
        }
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }

    /// Artifact names with a build in flight or queued.
    pub fn builds_in_flight(&self) -> usize {
        self.writer.in_flight()
    }

    pub fn kind(&self) -> AssetKind {
        self.compressor.kind()
    }

    pub fn config(&self) -> &PressConfig {
        &self.config
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn strategy(&self) -> CachingStrategy {
        self.config.cache
    }

    fn source_dir(&self) -> &Path {
        &self.config.dirs(self.kind()).source_dir
    }

    fn artifact_dir(&self) -> &Path {
        &self.config.dirs(self.kind()).artifact_dir
    }

    /// Resolve `path` (relative to the kind's source directory) for a
    /// render-time group.
    pub async fn source_file(
        &self,
        path: impl AsRef<Path>,
        compress: bool,
    ) -> PressResult<SourceFileRef> {
        let full: PathBuf = self.source_dir().join(path.as_ref());
        let modified = self
            .source
            .modified(&full)
            .await
            .map_err(|e| PressError::build(full.display().to_string(), e))?;
        Ok(SourceFileRef::new(full, compress, modified))
    }

    /// Render-time entry point. The returned key goes into the page markup.
    pub async fn register(&self, group: FileGroup) -> PressResult<CacheKey> {
        self.check_kind(&group)?;
        Ok(self.registry.register(group).await)
    }

    fn check_kind(&self, group: &FileGroup) -> PressResult<()> {
        if group.kind() != self.kind() {
            return Err(PressError::build(
                format!("{} group", group.kind()),
                format!("cannot be handled by the {} manager", self.kind()),
            ));
        }
        Ok(())
    }

    /// Convenience over [`source_file`](Self::source_file) and
    /// [`register`](Self::register).
    pub async fn register_files<P: AsRef<Path>>(
        &self,
        files: impl IntoIterator<Item = (P, bool)>,
    ) -> PressResult<CacheKey> {
        let mut refs = Vec::new();
        for (path, compress) in files {
            refs.push(self.source_file(path, compress).await?);
        }
        self.register(FileGroup::new(self.kind(), refs)).await
    }

    /// Request-time entry point.
    ///
    /// Static keys go to the static list of the same name; any other key
    /// must still be live in the registry.
    pub async fn get_artifact(&self, key: &CacheKey) -> PressResult<ArtifactHandle> {
        if let Some(name) = key.static_group_name() {
            return self.get_artifact_for_static_group(Some(name)).await;
        }
        let group = self.registry.resolve(key).await?;
        self.get_artifact_for_group(group).await
    }

    /// Artifact for a named static list; `None` means the kind's default list.
    pub async fn get_artifact_for_static_group(
        &self,
        name: Option<&str>,
    ) -> PressResult<ArtifactHandle> {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.compressor.static_config_name());
        let group = self
            .statics
            .load(name, self.kind(), self.source_dir(), self.config.enabled)
            .await?;
        self.get_artifact_for_group(group).await
    }

    /// Single-file bundle, compressed when minification is enabled. The
    /// file's extension must match this manager's kind.
    pub async fn get_artifact_for_file(&self, file_name: &str) -> PressResult<ArtifactHandle> {
        if AssetKind::from_file_name(file_name) != Some(self.kind()) {
            return Err(PressError::build(
                file_name,
                format!("not a .{} file", self.compressor.extension()),
            ));
        }
        let file = self.source_file(file_name, self.config.enabled).await?;
        let group = FileGroup::new(self.kind(), vec![file]);
        self.get_artifact_for_group(group).await
    }

    /// Name the artifact, consult the policy, build on a miss.
    ///
    /// Under `Change` the sources are read once and the same bytes are both
    /// fingerprinted and compressed.
    pub async fn get_artifact_for_group(
        &self,
        group: impl Into<Arc<FileGroup>>,
    ) -> PressResult<ArtifactHandle> {
        let group = group.into();
        self.check_kind(&group)?;
        let strategy = self.strategy();

        let (fingerprint, sources) = if strategy.embeds_fingerprint() {
            let sources = GroupSources::read(self.source.as_ref(), Arc::clone(&group)).await?;
            (sources.fingerprint(), Some(sources))
        } else {
            (Fingerprint::identity(&group), None)
        };
        let handle = ArtifactHandle::for_fingerprint(
            Arc::clone(&self.artifacts),
            self.artifact_dir(),
            &fingerprint,
            self.compressor.extension(),
        );

        if policy::use_cached_artifact(strategy, &handle).await? {
            debug!(artifact = %handle.name(), strategy = %strategy, "cache hit");
            return Ok(handle);
        }

        debug!(artifact = %handle.name(), strategy = %strategy, "cache miss");
        let sources = match sources {
            Some(sources) => sources,
            None => GroupSources::read(self.source.as_ref(), group).await?,
        };
        self.writer
            .write_artifact(Arc::clone(&self.compressor), sources, handle, strategy)
            .await
    }

    /// Content fingerprint under `Change`, name-only fingerprint otherwise.
    pub async fn fingerprint(&self, group: &FileGroup) -> PressResult<Fingerprint> {
        if self.strategy().embeds_fingerprint() {
            self.content_fingerprint(group).await
        } else {
            Ok(Fingerprint::identity(group))
        }
    }

    pub async fn content_fingerprint(&self, group: &FileGroup) -> PressResult<Fingerprint> {
        compressor::fingerprint(self.compressor.as_ref(), self.source.as_ref(), group).await
    }

    /// Remove every artifact of this kind. Registry entries survive, so pages
    /// already rendered rebuild on their next request.
    pub async fn clear_cache(&self) -> PressResult<usize> {
        if !self.config.cache_clear_enabled {
            warn!(kind = %self.kind(), "cache clear refused: disabled");
            return Err(PressError::PermissionDenied {
                operation: format!("clearing the {} cache", self.kind().label()),
            });
        }

        let dir = self.artifact_dir();
        let listed = self.artifacts.list(dir).await.map_err(|e| PressError::Storage {
            message: format!("failed to list {}: {}", dir.display(), e),
        })?;

        let extension = self.compressor.extension();
        let mut removed = 0;
        for path in listed
            .iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        {
            let gone = self.artifacts.remove(path).await.map_err(|e| PressError::Storage {
                message: format!("failed to remove {}: {}", path.display(), e),
            })?;
            if gone {
                removed += 1;
            }
        }

        info!(kind = %self.kind(), removed, "cleared artifact cache");
        Ok(removed)
    }
}
