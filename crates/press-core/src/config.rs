//! Process-wide bundling configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PressError, PressResult};
use crate::types::{AssetKind, CachingStrategy};

/// Source and artifact locations for one asset kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDirs {
    /// Directory of source files, relative to `source_root`.
    pub source_dir: PathBuf,

    /// Directory of built artifacts, relative to `artifact_root`.
    pub artifact_dir: PathBuf,
}

/// Bundling configuration.
///
/// Read once at startup and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressConfig {
    /// Whether files from static groups are minified.
    pub enabled: bool,

    /// Artifact reuse strategy.
    pub cache: CachingStrategy,

    /// How long a render-time key stays resolvable, in seconds.
    pub key_retention_secs: u64,

    /// Whether `clear_cache` is allowed.
    pub cache_clear_enabled: bool,

    /// Optional P3P header sent with long-lived artifacts.
    pub p3p_header: Option<String>,

    /// Root of the source storage.
    pub source_root: PathBuf,

    /// Root of the artifact storage.
    pub artifact_root: PathBuf,

    pub script: AssetDirs,

    pub style: AssetDirs,

    /// Directory holding static group lists, relative to `source_root`.
    pub static_config_dir: PathBuf,

    /// Period of the background registry sweep, in seconds.
    pub sweep_interval_secs: u64,
}

fn whole_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn default_key_retention_secs() -> u64 {
    120
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache: CachingStrategy::default(),
            key_retention_secs: default_key_retention_secs(),
            cache_clear_enabled: false,
            p3p_header: None,
            source_root: PathBuf::from("."),
            artifact_root: PathBuf::from("tmp/press"),
            script: AssetDirs {
                source_dir: PathBuf::from("public/javascripts"),
                artifact_dir: PathBuf::from("js"),
            },
            style: AssetDirs {
                source_dir: PathBuf::from("public/stylesheets"),
                artifact_dir: PathBuf::from("css"),
            },
            static_config_dir: PathBuf::from("conf"),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl PressConfig {
    /// Load configuration from a YAML file; absent keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> PressResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PressError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&content)
            .map_err(|e| PressError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Create config from environment variables, starting from defaults.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PRESS_ENABLED` | Minify static group members |
    /// | `PRESS_CACHE` | `always`, `never` or `change` |
    /// | `PRESS_KEY_LIFETIME` | Key retention, e.g. `2m` or `90s` |
    /// | `PRESS_CACHE_CLEAR_ENABLED` | Allow clearing the artifact cache |
    /// | `PRESS_P3P_HEADER` | P3P header value |
    /// | `PRESS_SOURCE_ROOT` | Source storage root |
    /// | `PRESS_ARTIFACT_ROOT` | Artifact storage root |
    pub fn from_env() -> PressResult<Self> {
        Self::default().merge_env()
    }

    /// Override fields with any `PRESS_*` variables that are set.
    pub fn merge_env(mut self) -> PressResult<Self> {
        if let Some(v) = env_var("PRESS_ENABLED") {
            self.enabled = parse_flag(&v);
        }
        if let Some(v) = env_var("PRESS_CACHE") {
            self.cache = v
                .parse()
                .map_err(|e: String| PressError::config(format!("PRESS_CACHE: {e}")))?;
        }
        if let Some(v) = env_var("PRESS_KEY_LIFETIME") {
            let lifetime = humantime::parse_duration(v.trim())
                .map_err(|e| PressError::config(format!("PRESS_KEY_LIFETIME: {e}")))?;
            if lifetime < Duration::from_secs(1) {
                return Err(PressError::config(format!(
                    "PRESS_KEY_LIFETIME: {} is shorter than one second",
                    humantime::format_duration(lifetime)
                )));
            }
            self.key_retention_secs = whole_secs(lifetime);
        }
        if let Some(v) = env_var("PRESS_CACHE_CLEAR_ENABLED") {
            self.cache_clear_enabled = parse_flag(&v);
        }
        if let Some(v) = env_var("PRESS_P3P_HEADER") {
            self.p3p_header = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = env_var("PRESS_SOURCE_ROOT") {
            self.source_root = PathBuf::from(v);
        }
        if let Some(v) = env_var("PRESS_ARTIFACT_ROOT") {
            self.artifact_root = PathBuf::from(v);
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make every key expire on registration.
    pub fn validate(&self) -> PressResult<()> {
        if self.key_retention_secs == 0 {
            return Err(PressError::config("key_retention_secs must be at least 1"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(PressError::config("sweep_interval_secs must be at least 1"));
        }
        Ok(())
    }

    pub fn key_retention(&self) -> Duration {
        Duration::from_secs(self.key_retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn dirs(&self, kind: AssetKind) -> &AssetDirs {
        match kind {
            AssetKind::Script => &self.script,
            AssetKind::Style => &self.style,
        }
    }

    /// Set the caching strategy.
    pub fn with_cache(mut self, cache: CachingStrategy) -> Self {
        self.cache = cache;
        self
    }

    /// Set the key retention window, rounded up to whole seconds.
    pub fn with_key_retention(mut self, retention: Duration) -> Self {
        self.key_retention_secs = whole_secs(retention);
        self
    }

    /// Enable or disable minification of static group members.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Allow or refuse `clear_cache`.
    pub fn with_cache_clear_enabled(mut self, enabled: bool) -> Self {
        self.cache_clear_enabled = enabled;
        self
    }

    /// Set the P3P header.
    pub fn with_p3p_header(mut self, header: impl Into<String>) -> Self {
        self.p3p_header = Some(header.into());
        self
    }

    /// Set both storage roots.
    pub fn with_roots(
        mut self,
        source_root: impl Into<PathBuf>,
        artifact_root: impl Into<PathBuf>,
    ) -> Self {
        self.source_root = source_root.into();
        self.artifact_root = artifact_root.into();
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_flag(value: &str) -> bool {
    let v = value.trim();
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}
