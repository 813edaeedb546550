//! Resolving a patch record to its diff text.

use crate::error::{Error, Result};
use crate::types::PatchRecord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of patch file contents.
pub trait ContentSource: Send + Sync {
    /// Read the diff text of a patch.
    fn read(&self, record: &PatchRecord) -> Result<String>;
}

/// Reads patch files from disk, resolving relative paths against a base
/// directory (normally the catalog's directory).
pub struct FsContent {
    base_dir: PathBuf,
}

impl FsContent {
    /// Create a reader rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve the on-disk location of a record.
    pub fn resolve(&self, record: &PatchRecord) -> PathBuf {
        if record.path.is_absolute() {
            record.path.clone()
        } else {
            self.base_dir.join(&record.path)
        }
    }
}

impl ContentSource for FsContent {
    fn read(&self, record: &PatchRecord) -> Result<String> {
        let path = self.resolve(record);
        fs::read_to_string(&path).map_err(|source| Error::ContentUnavailable {
            id: record.id.clone(),
            path,
            source,
        })
    }
}

/// In-memory contents keyed by patch path, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryContent {
    files: HashMap<PathBuf, String>,
}

impl MemoryContent {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content for a path.
    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Builder-style [`MemoryContent::insert`].
    pub fn with(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl ContentSource for MemoryContent {
    fn read(&self, record: &PatchRecord) -> Result<String> {
        self.files
            .get(&record.path)
            .cloned()
            .ok_or_else(|| Error::ContentUnavailable {
                id: record.id.clone(),
                path: record.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such patch file"),
            })
    }
}
