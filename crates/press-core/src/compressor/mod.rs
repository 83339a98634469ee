//! Per-kind compressors and the shared fingerprint/compress pipeline.

mod scan;
mod script;
mod style;

pub use script::{minify_script, ScriptCompressor};
pub use style::{minify_style, StyleCompressor};

use std::sync::Arc;

use tracing::debug;

use crate::error::{PressError, PressResult};
use crate::fingerprint::Fingerprint;
use crate::storage::Storage;
use crate::types::{AssetKind, FileGroup};

/// Minifier failures. Always fatal for the current build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MinifyError {
    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("syntax error: {message}")]
    Parse { message: String },
}

/// Capability set of one asset kind.
pub trait AssetCompressor: Send + Sync + 'static {
    fn kind(&self) -> AssetKind;

    fn extension(&self) -> &'static str {
        self.kind().extension()
    }

    fn static_config_name(&self) -> &'static str {
        self.kind().default_static_config()
    }

    fn minify(&self, source: &str) -> Result<String, MinifyError>;
}

fn check_kind<C: AssetCompressor + ?Sized>(compressor: &C, group: &FileGroup) -> PressResult<()> {
    if group.kind() != compressor.kind() {
        return Err(PressError::build(
            format!("{} group", group.kind()),
            format!("cannot be built by the {} compressor", compressor.kind()),
        ));
    }
    Ok(())
}

/// Bytes of every member of one group, read once.
///
/// Fingerprinting and compressing the same snapshot guarantees that an
/// artifact's bytes always match the content its name was derived from.
#[derive(Debug, Clone)]
pub struct GroupSources {
    group: Arc<FileGroup>,
    contents: Vec<Vec<u8>>,
}

impl GroupSources {
    /// Read every member of `group` from `source`, in order.
    pub async fn read(source: &dyn Storage, group: Arc<FileGroup>) -> PressResult<Self> {
        let mut contents = Vec::with_capacity(group.len());
        for file in group.files() {
            let bytes = source
                .read(&file.path)
                .await
                .map_err(|e| PressError::build(file.display_path(), e))?;
            contents.push(bytes);
        }
        Ok(Self { group, contents })
    }

    pub fn group(&self) -> &FileGroup {
        &self.group
    }

    /// Total size of the sources in bytes.
    pub fn source_len(&self) -> usize {
        self.contents.iter().map(Vec::len).sum()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let fp = Fingerprint::from_contents(
            self.group.kind(),
            self.group
                .files()
                .iter()
                .zip(self.contents.iter().map(Vec::as_slice)),
        );
        debug!(fingerprint = %fp.short(), files = self.group.len(), "computed content fingerprint");
        fp
    }

    /// Concatenate in order, minifying flagged members.
    ///
    /// Any unminifiable member aborts the whole build.
    pub fn compress<C: AssetCompressor + ?Sized>(&self, compressor: &C) -> PressResult<Vec<u8>> {
        check_kind(compressor, &self.group)?;

        let mut out = Vec::with_capacity(self.source_len());
        for (file, bytes) in self.group.files().iter().zip(&self.contents) {
            if !file.compress {
                out.extend_from_slice(bytes);
                continue;
            }

            let target = file.display_path();
            let text = std::str::from_utf8(bytes)
                .map_err(|e| PressError::build(&target, format!("not valid UTF-8: {e}")))?;
            let minified = compressor
                .minify(text)
                .map_err(|e| PressError::build(&target, e))?;
            out.extend_from_slice(minified.as_bytes());
        }
        Ok(out)
    }
}

/// Content fingerprint of `group`, reading every member from `source`.
pub async fn fingerprint<C: AssetCompressor + ?Sized>(
    compressor: &C,
    source: &dyn Storage,
    group: &FileGroup,
) -> PressResult<Fingerprint> {
    check_kind(compressor, group)?;
    let sources = GroupSources::read(source, Arc::new(group.clone())).await?;
    Ok(sources.fingerprint())
}

/// Read and compress `group` in one step.
pub async fn compress<C: AssetCompressor + ?Sized>(
    compressor: &C,
    source: &dyn Storage,
    group: &FileGroup,
) -> PressResult<Vec<u8>> {
    check_kind(compressor, group)?;
    GroupSources::read(source, Arc::new(group.clone()))
        .await?
        .compress(compressor)
}
