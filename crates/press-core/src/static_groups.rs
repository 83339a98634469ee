//! Named file groups declared in list files under the static config dir.
//!
//! A list holds one path per line, relative to the asset kind's source
//! directory. Blank lines and `#` comments are skipped.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PressError, PressResult};
use crate::storage::Storage;
use crate::types::{AssetKind, FileGroup, SourceFileRef};

#[derive(Debug)]
pub struct StaticGroups {
    source: Arc<dyn Storage>,
    config_dir: PathBuf,
    loaded: RwLock<HashMap<(AssetKind, String), Arc<FileGroup>>>,
}

impl StaticGroups {
    pub fn new(source: Arc<dyn Storage>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            config_dir: config_dir.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Group declared by list `name`, loaded on first use.
    ///
    /// Successful loads are kept for the process lifetime; failures are not,
    /// so a corrected list is picked up by the next call.
    pub async fn load(
        &self,
        name: &str,
        kind: AssetKind,
        source_dir: &Path,
        compress: bool,
    ) -> PressResult<Arc<FileGroup>> {
        let memo_key = (kind, name.to_string());
        if let Some(group) = self.loaded.read().await.get(&memo_key) {
            return Ok(Arc::clone(group));
        }

        let group = Arc::new(self.read_list(name, kind, source_dir, compress).await?);
        debug!(list = %name, kind = %kind, files = group.len(), "loaded static group");

        let mut loaded = self.loaded.write().await;
        Ok(Arc::clone(loaded.entry(memo_key).or_insert(group)))
    }

    async fn read_list(
        &self,
        name: &str,
        kind: AssetKind,
        source_dir: &Path,
        compress: bool,
    ) -> PressResult<FileGroup> {
        if !is_plain_name(name) {
            return Err(PressError::config(format!(
                "invalid static group name: {name:?}"
            )));
        }

        let list_path = self.config_dir.join(name);
        let bytes = self.source.read(&list_path).await.map_err(|e| {
            PressError::config(format!(
                "cannot read static group list {}: {}",
                list_path.display(),
                e
            ))
        })?;
        let text = String::from_utf8(bytes).map_err(|_| {
            PressError::config(format!("{} is not valid UTF-8", list_path.display()))
        })?;

        let entries = parse_list(&text);
        if entries.is_empty() {
            return Err(PressError::config(format!(
                "static group list {} has no entries",
                list_path.display()
            )));
        }

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = source_dir.join(entry);
            let modified = self.source.modified(&path).await.map_err(|e| {
                PressError::config(format!(
                    "{} lists {}, which cannot be read: {}",
                    list_path.display(),
                    path.display(),
                    e
                ))
            })?;
            files.push(SourceFileRef::new(path, compress, modified));
        }
        Ok(FileGroup::new(kind, files))
    }
}

/// Exactly one normal path component.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn parse_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}
