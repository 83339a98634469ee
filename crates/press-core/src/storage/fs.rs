use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use super::{check_relative, is_temp_name, Storage};

/// Storage rooted at a directory on local disk.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        check_relative(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?).await
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let target = self.resolve(path)?;
        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no file name in {}", path.display()),
                )
            })?
            .to_string();
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        fs::create_dir_all(&parent).await?;

        // Unique per writer, so concurrent builders never share a temp file
        let temp = parent.join(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        fs::write(&temp, bytes).await?;
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        debug!(path = %target.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(self.resolve(path)?).await
    }

    async fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        let meta = fs::metadata(self.resolve(path)?).await?;
        Ok(DateTime::<Utc>::from(meta.modified()?))
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let full = self.resolve(dir)?;
        let mut entries = match fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if is_temp_name(name) {
                continue;
            }
            files.push(dir.join(name));
        }
        files.sort();
        Ok(files)
    }

    async fn remove(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(self.resolve(path)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path());

        storage
            .write_atomic(Path::new("js/abc.js"), b"var a=1;\n")
            .await
            .unwrap();

        assert!(storage.exists(Path::new("js/abc.js")).await.unwrap());
        assert_eq!(
            storage.read(Path::new("js/abc.js")).await.unwrap(),
            b"var a=1;\n"
        );

        let on_disk: Vec<_> = std::fs::read_dir(temp.path().join("js"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(on_disk.len(), 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path());
        let path = Path::new("css/site.css");

        storage.write_atomic(path, b"a{}").await.unwrap();
        storage.write_atomic(path, b"b{}").await.unwrap();

        assert_eq!(storage.read(path).await.unwrap(), b"b{}");
    }

    #[tokio::test]
    async fn list_skips_temp_files_and_missing_dirs() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path());

        assert!(storage.list(Path::new("js")).await.unwrap().is_empty());

        storage.write_atomic(Path::new("js/b.js"), b"b").await.unwrap();
        storage.write_atomic(Path::new("js/a.js"), b"a").await.unwrap();
        std::fs::write(temp.path().join("js/.a.js.0000.tmp"), b"partial").unwrap();

        let listed = storage.list(Path::new("js")).await.unwrap();
        assert_eq!(
            listed,
            vec![PathBuf::from("js/a.js"), PathBuf::from("js/b.js")]
        );
    }

    #[tokio::test]
    async fn remove_reports_absence() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path());
        storage.write_atomic(Path::new("x.js"), b"x").await.unwrap();

        assert!(storage.remove(Path::new("x.js")).await.unwrap());
        assert!(!storage.remove(Path::new("x.js")).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_paths_outside_root() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().join("root"));

        let err = storage.read(Path::new("../outside")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(storage
            .write_atomic(Path::new("/tmp/abs.js"), b"x")
            .await
            .is_err());
    }
}
