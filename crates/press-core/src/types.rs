//! Core data model: asset kinds, caching strategies, source files, groups and keys.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of asset a bundle is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    /// Artifact file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }

    /// Static group list used when the request names none.
    pub fn default_static_config(self) -> &'static str {
        match self {
            Self::Script => "js.conf",
            Self::Style => "css.conf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Script => "text/javascript; charset=utf-8",
            Self::Style => "text/css; charset=utf-8",
        }
    }

    /// Label used in diagnostics and admin messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Script => "JavaScript",
            Self::Style => "CSS",
        }
    }

    /// Detects the kind from a file name extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("js") => Some(Self::Script),
            Some("css") => Some(Self::Style),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "js" | "script" | "javascript" => Ok(Self::Script),
            "css" | "style" | "stylesheet" => Ok(Self::Style),
            other => Err(format!("unknown asset kind: {other}")),
        }
    }
}

/// Whether an existing artifact may be served as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachingStrategy {
    /// Reuse whatever exists under the logical name, even if sources changed.
    Always,
    /// Rebuild on every request.
    Never,
    /// Artifact name embeds the content fingerprint.
    #[default]
    #[serde(alias = "change_detection", alias = "changedetection")]
    Change,
}

impl CachingStrategy {
    /// True when artifact names are derived from file contents.
    pub fn embeds_fingerprint(self) -> bool {
        matches!(self, Self::Change)
    }

    /// True when an artifact produced by a concurrent builder may be reused.
    pub fn reuses_artifacts(self) -> bool {
        !matches!(self, Self::Never)
    }
}

impl fmt::Display for CachingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
            Self::Change => write!(f, "change"),
        }
    }
}

impl FromStr for CachingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "change" | "changedetection" | "change_detection" => Ok(Self::Change),
            other => Err(format!("unknown caching strategy: {other}")),
        }
    }
}

/// One member of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileRef {
    /// Path relative to the source storage root.
    pub path: PathBuf,

    /// Whether the file is minified before concatenation.
    pub compress: bool,

    /// Last modification time observed when the reference was resolved.
    pub modified: DateTime<Utc>,
}

impl SourceFileRef {
    pub fn new(path: impl Into<PathBuf>, compress: bool, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            compress,
            modified,
        }
    }

    /// Path rendered with forward slashes, used for hashing and logs.
    pub fn display_path(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Ordered list of files concatenated into one artifact.
///
/// Groups are immutable once built; the registry shares them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    kind: AssetKind,
    files: Arc<[SourceFileRef]>,
}

impl FileGroup {
    pub fn new(kind: AssetKind, files: Vec<SourceFileRef>) -> Self {
        Self {
            kind,
            files: files.into(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn files(&self) -> &[SourceFileRef] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Newest modification time among members.
    pub fn latest_modified(&self) -> Option<DateTime<Utc>> {
        self.files.iter().map(|f| f.modified).max()
    }
}

const STATIC_KEY_PREFIX: &str = "static:";

/// Token binding a request to a file group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Fresh random key for a render-time group.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Deterministic key for a named static group.
    pub fn for_static_group(name: &str) -> Self {
        Self(format!("{STATIC_KEY_PREFIX}{name}"))
    }

    pub fn is_static(&self) -> bool {
        self.0.starts_with(STATIC_KEY_PREFIX)
    }

    /// Name of the static group, if this key addresses one.
    pub fn static_group_name(&self) -> Option<&str> {
        self.0.strip_prefix(STATIC_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
