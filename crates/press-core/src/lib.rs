//! On-demand script and style bundling with fingerprinted artifact caching.
//!
//! While a page renders, the templating layer registers the ordered list of
//! source files it needs and embeds the returned key in a URL. When the
//! browser requests that URL, the bundle manager resolves the key, reuses a
//! cached artifact when the caching strategy allows, and otherwise builds one
//! (concatenate, minify flagged files, write atomically).
//!
//! - Key registry with a bounded retention window
//! - Content fingerprints naming artifacts under change detection
//! - Single-flight builds per artifact name
//! - Static groups declared in list files (`conf/js.conf`, `conf/css.conf`)
//! - Framework-agnostic response builders for the HTTP boundary
//!
//! # Quick Start
//!
//! ```no_run
//! use press_core::{BundleManager, PressConfig, ScriptCompressor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let manager = BundleManager::from_config(PressConfig::from_env()?, ScriptCompressor);
//!
//! // Render time
//! let key = manager
//!     .register_files([("app.js", true), ("vendor.js", false)])
//!     .await?;
//!
//! // Request time
//! let artifact = manager.get_artifact(&key).await?;
//! let bytes = artifact.read().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Caching strategies
//!
//! | Strategy | Artifact name | Existing artifact |
//! |----------|---------------|-------------------|
//! | `always` | file paths    | served, even if sources changed |
//! | `never`  | file paths    | rebuilt on every request |
//! | `change` | file contents | served; edits produce a new name |

pub mod compressor;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod handle;
pub mod manager;
pub mod policy;
pub mod registry;
pub mod response;
pub mod static_groups;
pub mod storage;
pub mod types;
pub mod writer;

// Re-export main types
pub use compressor::{
    AssetCompressor, GroupSources, MinifyError, ScriptCompressor, StyleCompressor,
};
pub use config::{AssetDirs, PressConfig};
pub use error::{PressError, PressResult};
pub use fingerprint::Fingerprint;
pub use handle::ArtifactHandle;
pub use manager::{BundleManager, ScriptBundleManager, StyleBundleManager};
pub use registry::{KeyRegistry, SweeperHandle};
pub use response::AssetResponse;
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use types::{AssetKind, CacheKey, CachingStrategy, FileGroup, SourceFileRef};
pub use writer::ArtifactWriter;
