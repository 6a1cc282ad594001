//! Text storage seam between the locale service and the host.
//!
//! The host owns file contents (open editor buffers, disk); the service only
//! needs "read current text" and "replace text".

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait TextStore: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<String>;

    /// Replace the full contents of `path`
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Disk-backed store; writes go through a temp file in the same directory
/// and are renamed into place.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTextStore;

impl TextStore for FsTextStore {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-memory store, standing in for unsaved editor buffers.
#[derive(Debug, Default)]
pub struct MemoryTextStore {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.write().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().get(path).cloned()
    }
}

impl TextStore for MemoryTextStore {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        self.get(path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no buffer for {}", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }
}
