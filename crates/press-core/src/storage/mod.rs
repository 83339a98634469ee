//! Storage capability for sources and artifacts.
//!
//! All paths are relative to the storage root. Absolute paths and paths
//! containing `..` are rejected with [`io::ErrorKind::InvalidInput`].

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Storage: Send + Sync + fmt::Debug {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write the whole file so readers see either the old or the new bytes.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;

    async fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>>;

    /// Files directly inside `dir`, as root-relative paths, sorted.
    /// A missing directory lists as empty.
    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns false if there was nothing to remove.
    async fn remove(&self, path: &Path) -> io::Result<bool>;
}

pub(crate) fn check_relative(path: &Path) -> io::Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path escapes storage root: {}", path.display()),
                ));
            }
        }
    }
    Ok(())
}

/// True for temp files left by an interrupted atomic write.
pub(crate) fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}
