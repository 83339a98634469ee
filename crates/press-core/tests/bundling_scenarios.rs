//! End-to-end bundling against real files in a temp directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use press_core::compressor::minify_script;
use press_core::{
    AssetCompressor, AssetKind, AssetResponse, BundleManager, CachingStrategy, FsStorage,
    KeyRegistry, MinifyError, PressConfig, PressError, ScriptCompressor, Storage,
};
use tempfile::TempDir;

const APP_JS: &str = "// application\nfunction greet(name) {\n  return 'hi ' + name;\n}\n";
const VENDOR_JS: &str = "/* vendor build */\nvar  lib  =  {};\n";

/// Script compressor that counts how often it minifies.
#[derive(Debug, Clone, Default)]
struct CountingCompressor {
    calls: Arc<AtomicUsize>,
}

impl CountingCompressor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetCompressor for CountingCompressor {
    fn kind(&self) -> AssetKind {
        AssetKind::Script
    }

    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ScriptCompressor.minify(source)
    }
}

struct Site {
    _dir: TempDir,
    root: PathBuf,
}

impl Site {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let site = Self { _dir: dir, root };
        site.write_script("app.js", APP_JS);
        site.write_script("vendor.js", VENDOR_JS);
        site
    }

    fn write_script(&self, name: &str, body: &str) {
        let path = self.root.join("site/public/javascripts").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn write_list(&self, name: &str, body: &str) {
        let path = self.root.join("site/conf").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn config(&self, strategy: CachingStrategy) -> PressConfig {
        PressConfig::default()
            .with_cache(strategy)
            .with_roots(self.root.join("site"), self.root.join("artifacts"))
    }

    fn manager(
        &self,
        strategy: CachingStrategy,
        compressor: CountingCompressor,
    ) -> BundleManager<CountingCompressor> {
        BundleManager::from_config(self.config(strategy), compressor)
    }

    fn artifact_files(&self) -> Vec<PathBuf> {
        let dir = self.root.join("artifacts/js");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<_> = entries.map(|e| e.unwrap().path()).collect();
        files.sort();
        files
    }
}

#[tokio::test]
async fn registered_group_is_minified_and_concatenated() {
    let site = Site::new();
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let key = manager
        .register_files([("app.js", true), ("vendor.js", false)])
        .await
        .unwrap();
    let artifact = manager.get_artifact(&key).await.unwrap();

    assert!(artifact.exists().await.unwrap());
    let expected = format!("{}{}", minify_script(APP_JS).unwrap(), VENDOR_JS);
    assert_eq!(String::from_utf8(artifact.read().await.unwrap()).unwrap(), expected);
    let minified = minify_script(APP_JS).unwrap();
    assert!(!minified.contains("application"));
    assert!(minified.contains("greet"));
    assert!(minified.len() < APP_JS.len());
}

#[tokio::test]
async fn expired_key_yields_diagnostic_with_retention() {
    let site = Site::new();
    let config = Arc::new(site.config(CachingStrategy::Change));
    let source: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.source_root));
    let artifacts: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.artifact_root));
    let manager = BundleManager::with_components(
        config.clone(),
        ScriptCompressor,
        source,
        artifacts,
        KeyRegistry::new(Duration::from_millis(200)),
    );

    let key = manager.register_files([("app.js", true)]).await.unwrap();
    assert!(manager.get_artifact(&key).await.is_ok());

    tokio::time::sleep(Duration::from_millis(300)).await;

    let err = manager.get_artifact(&key).await.unwrap_err();
    assert!(matches!(err, PressError::UnresolvedKey { .. }));

    let response = AssetResponse::from_error(AssetKind::Script, &err, &config);
    let body = String::from_utf8(response.body).unwrap();
    assert_eq!(response.status, 404);
    assert!(body.starts_with("/*"));
    assert!(body.contains("200ms"), "{body}");
}

#[tokio::test]
async fn change_detection_reuses_unchanged_group() {
    let site = Site::new();
    let compressor = CountingCompressor::default();
    let manager = site.manager(CachingStrategy::Change, compressor.clone());

    let key = manager.register_files([("app.js", true)]).await.unwrap();
    let first = manager.get_artifact(&key).await.unwrap();
    let second = manager.get_artifact(&key).await.unwrap();

    assert_eq!(first.name(), second.name());
    assert_eq!(compressor.calls(), 1);
}

#[tokio::test]
async fn change_detection_gives_edits_a_new_artifact() {
    let site = Site::new();
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let key = manager.register_files([("app.js", true)]).await.unwrap();
    let before = manager.get_artifact(&key).await.unwrap();

    site.write_script("app.js", "var changed = true;\n");
    let after = manager.get_artifact(&key).await.unwrap();

    assert_ne!(before.name(), after.name());
    assert_eq!(before.read().await.unwrap(), minify_script(APP_JS).unwrap().as_bytes());
    assert_eq!(
        after.read().await.unwrap(),
        minify_script("var changed = true;\n").unwrap().as_bytes()
    );
    assert_eq!(site.artifact_files().len(), 2);
}

#[tokio::test]
async fn never_rebuilds_identical_group() {
    let site = Site::new();
    let compressor = CountingCompressor::default();
    let manager = site.manager(CachingStrategy::Never, compressor.clone());

    let key = manager.register_files([("app.js", true)]).await.unwrap();
    manager.get_artifact(&key).await.unwrap();
    manager.get_artifact(&key).await.unwrap();

    assert_eq!(compressor.calls(), 2);
    assert_eq!(site.artifact_files().len(), 1);
}

#[tokio::test]
async fn always_serves_stale_artifact_after_edit() {
    let site = Site::new();
    let compressor = CountingCompressor::default();
    let manager = site.manager(CachingStrategy::Always, compressor.clone());

    let key = manager.register_files([("app.js", true)]).await.unwrap();
    let before = manager.get_artifact(&key).await.unwrap().read().await.unwrap();

    site.write_script("app.js", "var changed = true;\n");
    let after = manager.get_artifact(&key).await.unwrap().read().await.unwrap();

    assert_eq!(before, after);
    assert_eq!(compressor.calls(), 1);
}

#[tokio::test]
async fn artifact_names_survive_restarts() {
    let site = Site::new();
    let files = [("app.js", true), ("vendor.js", false)];

    let first = site.manager(CachingStrategy::Change, CountingCompressor::default());
    let key = first.register_files(files).await.unwrap();
    let name = first.get_artifact(&key).await.unwrap().name().to_string();

    // Fresh manager, fresh registry
    let compressor = CountingCompressor::default();
    let second = site.manager(CachingStrategy::Change, compressor.clone());
    let key = second.register_files(files).await.unwrap();
    let handle = second.get_artifact(&key).await.unwrap();

    assert_eq!(handle.name(), name);
    assert_eq!(compressor.calls(), 0);
}

#[tokio::test]
async fn reordering_members_changes_artifact() {
    let site = Site::new();
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let ab = manager
        .register_files([("app.js", true), ("vendor.js", true)])
        .await
        .unwrap();
    let ba = manager
        .register_files([("vendor.js", true), ("app.js", true)])
        .await
        .unwrap();

    let ab = manager.get_artifact(&ab).await.unwrap();
    let ba = manager.get_artifact(&ba).await.unwrap();
    assert_ne!(ab.name(), ba.name());
}

#[tokio::test]
async fn static_group_from_list_file() {
    let site = Site::new();
    site.write_list("js.conf", "# main bundle\nvendor.js\napp.js\n");
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let handle = manager.get_artifact_for_static_group(None).await.unwrap();
    let body = String::from_utf8(handle.read().await.unwrap()).unwrap();

    let expected = format!(
        "{}{}",
        minify_script(VENDOR_JS).unwrap(),
        minify_script(APP_JS).unwrap()
    );
    assert_eq!(body, expected);
}

#[tokio::test]
async fn missing_static_list_is_config_error() {
    let site = Site::new();
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let err = manager
        .get_artifact_for_static_group(Some("missing.conf"))
        .await
        .unwrap_err();
    assert!(matches!(err, PressError::Config { .. }));

    let response = AssetResponse::from_error(AssetKind::Script, &err, manager.config());
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn clear_cache_removes_artifacts_from_disk() {
    let site = Site::new();
    let config = site
        .config(CachingStrategy::Change)
        .with_cache_clear_enabled(true);
    let manager = BundleManager::from_config(config, ScriptCompressor);

    manager.get_artifact_for_file("app.js").await.unwrap();
    manager.get_artifact_for_file("vendor.js").await.unwrap();
    assert_eq!(site.artifact_files().len(), 2);

    let removed = manager.clear_cache().await.unwrap();
    assert_eq!(removed, 2);
    assert!(site.artifact_files().is_empty());

    let response = AssetResponse::cleared(manager.kind(), removed);
    assert_eq!(response.body, b"Cleared 2 JS files from cache");
}

#[tokio::test]
async fn failed_build_is_retried_on_next_request() {
    let site = Site::new();
    site.write_script("broken.js", "var s = 'unterminated;\n");
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());

    let key = manager.register_files([("broken.js", true)]).await.unwrap();
    let err = manager.get_artifact(&key).await.unwrap_err();
    assert!(matches!(err, PressError::Build { .. }));
    assert!(site.artifact_files().is_empty());

    site.write_script("broken.js", "var s = 'fixed';\n");
    let handle = manager.get_artifact(&key).await.unwrap();
    assert_eq!(
        handle.read().await.unwrap(),
        minify_script("var s = 'fixed';\n").unwrap().as_bytes()
    );
}

#[tokio::test]
async fn artifact_response_for_built_bundle() {
    let site = Site::new();
    let manager = site.manager(CachingStrategy::Change, CountingCompressor::default());
    let key = manager.register_files([("app.js", true)]).await.unwrap();
    let handle = manager.get_artifact(&key).await.unwrap();

    let response = AssetResponse::artifact(
        manager.kind(),
        manager.strategy(),
        &handle,
        manager.config(),
    )
    .await
    .unwrap()
    .gzip()
    .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Cache-Control"), Some("max-age=31536000"));
    assert_eq!(response.header("Content-Encoding"), Some("gzip"));
    assert!(Path::new(handle.name())
        .extension()
        .is_some_and(|ext| ext == "js"));
}
