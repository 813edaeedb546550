//! Patch catalog: ordered pools of required and optional patches.
//!
//! The catalog is a TOML file with one `[[patch]]` table per patch:
//!
//! ```toml
//! [[patch]]
//! id = "MC-1001"
//! path = "patches/MC-1001.patch"
//! type = "required"
//!
//! [[patch]]
//! id = "MC-2002"
//! path = "patches/MC-2002.patch"
//! type = "optional"
//! deprecated = true
//! title = "Fix indexer lock"
//! ```
//!
//! Declaration order is application order.

use crate::error::{Error, Result};
use crate::types::{PatchRecord, PatchType};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "patch")]
    patches: Vec<PatchRecord>,
}

/// An ordered collection of patch records.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    records: Vec<PatchRecord>,
}

impl Pool {
    /// Create a pool from records, keeping their order.
    pub fn new(records: Vec<PatchRecord>) -> Self {
        Self { records }
    }

    /// All records in pool order.
    pub fn records(&self) -> &[PatchRecord] {
        &self.records
    }

    /// Records matching `filter`, in pool order.
    ///
    /// With `None` every record is returned. Ids in the filter that the
    /// pool does not know are ignored.
    pub fn list(&self, filter: Option<&[String]>) -> Vec<&PatchRecord> {
        match filter {
            None => self.records.iter().collect(),
            Some(ids) => {
                let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
                self.records
                    .iter()
                    .filter(|r| wanted.contains(r.id.as_str()))
                    .collect()
            }
        }
    }

    /// Find a record by id.
    pub fn get(&self, id: &str) -> Option<&PatchRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Ids in pool order.
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The full patch catalog, partitioned into required and optional pools.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    base_dir: PathBuf,
    required: Pool,
    optional: Pool,
}

impl Catalog {
    /// Build a catalog from records.
    ///
    /// Fails on empty or duplicate ids.
    pub fn new(records: Vec<PatchRecord>, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if record.id.trim().is_empty() {
                return Err(Error::InvalidCatalog {
                    message: format!("patch with empty id ({})", record.path.display()),
                });
            }
            if record.path.as_os_str().is_empty() {
                return Err(Error::InvalidCatalog {
                    message: format!("patch {} has no path", record.id),
                });
            }
            if !seen.insert(record.id.as_str()) {
                return Err(Error::DuplicatePatch(record.id.clone()));
            }
        }

        let (required, optional): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| r.patch_type == PatchType::Required);

        Ok(Self {
            base_dir: base_dir.into(),
            required: Pool::new(required),
            optional: Pool::new(optional),
        })
    }

    /// Load a catalog file. Patch paths resolve relative to its directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::CatalogNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let catalog = Self::parse(&content, base_dir)?;
        log::debug!(
            "Loaded catalog {} ({} required, {} optional)",
            path.display(),
            catalog.required.len(),
            catalog.optional.len()
        );
        Ok(catalog)
    }

    /// Parse catalog TOML.
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.patches, base_dir)
    }

    /// Directory patch paths are relative to.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Required patches in application order.
    pub fn list_required(&self) -> &[PatchRecord] {
        self.required.records()
    }

    /// Optional patches, optionally restricted to `filter`.
    pub fn list_optional(&self, filter: Option<&[String]>) -> Vec<&PatchRecord> {
        self.optional.list(filter)
    }

    /// The required pool.
    pub fn required(&self) -> &Pool {
        &self.required
    }

    /// The optional pool.
    pub fn optional(&self) -> &Pool {
        &self.optional
    }

    /// Find a record in either pool.
    pub fn find(&self, id: &str) -> Option<&PatchRecord> {
        self.required.get(id).or_else(|| self.optional.get(id))
    }

    /// Every record, required first, each pool in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &PatchRecord> {
        self.required.records.iter().chain(self.optional.records.iter())
    }

    /// Total number of patches.
    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    /// Whether the catalog declares no patches.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}
