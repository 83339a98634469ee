use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::{check_relative, Storage};

/// In-process storage, used by tests and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    files: BTreeMap<PathBuf, MemoryFile>,
    writes: usize,
    last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `write_atomic` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn normalize(path: &Path) -> io::Result<PathBuf> {
    check_relative(path)?;
    Ok(path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let key = normalize(path)?;
        self.lock()
            .files
            .get(&key)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| not_found(path))
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let key = normalize(path)?;
        let mut inner = self.lock();

        // Strictly increasing, even for writes within the same clock tick
        let now = Utc::now();
        let modified = match inner.last_modified {
            Some(last) if now <= last => last + TimeDelta::milliseconds(1),
            _ => now,
        };
        inner.last_modified = Some(modified);
        inner.writes += 1;
        inner.files.insert(
            key,
            MemoryFile {
                bytes: bytes.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let key = normalize(path)?;
        Ok(self.lock().files.contains_key(&key))
    }

    async fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        let key = normalize(path)?;
        self.lock()
            .files
            .get(&key)
            .map(|f| f.modified)
            .ok_or_else(|| not_found(path))
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = normalize(dir)?;
        Ok(self
            .lock()
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect())
    }

    async fn remove(&self, path: &Path) -> io::Result<bool> {
        let key = normalize(path)?;
        Ok(self.lock().files.remove(&key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_back_and_count_writes() {
        let storage = MemoryStorage::new();
        storage
            .write_atomic(Path::new("js/a.js"), b"a")
            .await
            .unwrap();
        storage
            .write_atomic(Path::new("./js/a.js"), b"b")
            .await
            .unwrap();

        assert_eq!(storage.read(Path::new("js/a.js")).await.unwrap(), b"b");
        assert_eq!(storage.write_count(), 2);
        assert_eq!(storage.file_count(), 1);
    }

    #[tokio::test]
    async fn modified_is_monotonic() {
        let storage = MemoryStorage::new();
        let path = Path::new("a.css");

        storage.write_atomic(path, b"1").await.unwrap();
        let first = storage.modified(path).await.unwrap();
        storage.write_atomic(path, b"2").await.unwrap();
        let second = storage.modified(path).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn list_is_shallow() {
        let storage = MemoryStorage::new();
        for path in ["js/a.js", "js/b.js", "js/nested/c.js", "css/d.css"] {
            storage.write_atomic(Path::new(path), b"x").await.unwrap();
        }

        let listed = storage.list(Path::new("js")).await.unwrap();
        assert_eq!(
            listed,
            vec![PathBuf::from("js/a.js"), PathBuf::from("js/b.js")]
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.read(Path::new("nope.js")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!storage.exists(Path::new("nope.js")).await.unwrap());
        assert!(!storage.remove(Path::new("nope.js")).await.unwrap());
    }
}
