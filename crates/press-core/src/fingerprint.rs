use sha2::{Digest, Sha256};

use crate::types::{AssetKind, FileGroup, SourceFileRef};

/// Bumped whenever minifier output changes, so old artifacts stop matching.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hex: String,
    pub components: Vec<String>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

impl Fingerprint {
    /// Computes a content fingerprint from each member and the digest of its bytes.
    ///
    /// Members are hashed in concatenation order, so reordering changes the result.
    pub fn from_contents<'a, I>(kind: AssetKind, members: I) -> Self
    where
        I: IntoIterator<Item = (&'a SourceFileRef, &'a [u8])>,
    {
        let mut parts = header(kind);
        for (file, bytes) in members {
            parts.push(format!(
                "file={} compress={} sha256={}",
                file.display_path(),
                file.compress,
                sha256_hex(bytes)
            ));
        }
        Self::from_parts(parts)
    }

    /// Computes a name-only fingerprint: same paths and flags give the same name,
    /// whatever the files contain.
    pub fn identity(group: &FileGroup) -> Self {
        let mut parts = header(group.kind());
        for file in group.files() {
            parts.push(format!(
                "file={} compress={}",
                file.display_path(),
                file.compress
            ));
        }
        Self::from_parts(parts)
    }

    fn from_parts(parts: Vec<String>) -> Self {
        let raw = parts.join("\n");
        Self {
            hex: sha256_hex(raw.as_bytes()),
            components: parts,
        }
    }

    /// Artifact file name: `<hex>.<ext>`.
    pub fn artifact_name(&self, extension: &str) -> String {
        format!("{}.{}", self.hex, extension)
    }

    /// Prefix used in log lines.
    pub fn short(&self) -> &str {
        &self.hex[..self.hex.len().min(12)]
    }
}

fn header(kind: AssetKind) -> Vec<String> {
    vec![
        format!("format={ARTIFACT_FORMAT_VERSION}"),
        format!("kind={kind}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn file(path: &str, compress: bool) -> SourceFileRef {
        SourceFileRef::new(path, compress, DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn content_fingerprint_is_deterministic() {
        let a = file("a.js", true);
        let b = file("b.js", false);
        let members = [(&a, b"one".as_slice()), (&b, b"two".as_slice())];

        let first = Fingerprint::from_contents(AssetKind::Script, members);
        let second = Fingerprint::from_contents(AssetKind::Script, members);
        assert_eq!(first, second);
        assert_eq!(first.hex.len(), 64);
    }

    #[test]
    fn content_fingerprint_sensitivity() {
        let a = file("a.js", true);
        let b = file("b.js", true);
        let base = Fingerprint::from_contents(
            AssetKind::Script,
            [(&a, b"one".as_slice()), (&b, b"two".as_slice())],
        );

        let reordered = Fingerprint::from_contents(
            AssetKind::Script,
            [(&b, b"two".as_slice()), (&a, b"one".as_slice())],
        );
        let modified = Fingerprint::from_contents(
            AssetKind::Script,
            [(&a, b"one!".as_slice()), (&b, b"two".as_slice())],
        );
        let removed = Fingerprint::from_contents(AssetKind::Script, [(&a, b"one".as_slice())]);
        let other_kind = Fingerprint::from_contents(
            AssetKind::Style,
            [(&a, b"one".as_slice()), (&b, b"two".as_slice())],
        );

        for other in [reordered, modified, removed, other_kind] {
            assert_ne!(base.hex, other.hex);
        }
    }

    #[test]
    fn identity_ignores_mtime_but_not_flags() {
        let group = FileGroup::new(AssetKind::Style, vec![file("site.css", true)]);
        let later = FileGroup::new(
            AssetKind::Style,
            vec![SourceFileRef::new(
                "site.css",
                true,
                DateTime::from_timestamp(9_999, 0).unwrap(),
            )],
        );
        let unflagged = FileGroup::new(AssetKind::Style, vec![file("site.css", false)]);

        assert_eq!(Fingerprint::identity(&group), Fingerprint::identity(&later));
        assert_ne!(Fingerprint::identity(&group), Fingerprint::identity(&unflagged));
    }

    #[test]
    fn artifact_name_uses_extension() {
        let fp = Fingerprint::identity(&FileGroup::new(AssetKind::Script, vec![]));
        let name = fp.artifact_name("js");
        assert!(name.ends_with(".js"));
        assert_eq!(name.len(), 64 + 3);
        assert_eq!(fp.short().len(), 12);
    }
}
