//! Core types for patch records.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether a patch is always applied or selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchType {
    /// Applied on every deployment, in catalog order
    Required,
    /// Applied only when explicitly selected
    Optional,
}

impl PatchType {
    /// Name used in the catalog file.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchType::Required => "required",
            PatchType::Optional => "optional",
        }
    }
}

impl std::fmt::Display for PatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single patch declared in the catalog.
///
/// Records are immutable once loaded and are always handed around by
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Unique identifier (e.g., "MCLOUD-1234")
    pub id: String,
    /// Location of the diff file, relative to the catalog directory
    pub path: PathBuf,
    /// Required or optional
    #[serde(rename = "type")]
    pub patch_type: PatchType,
    /// Deprecated patches are never suggested as optional candidates
    #[serde(default)]
    pub deprecated: bool,
    /// Short human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PatchRecord {
    /// Create a new record.
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, patch_type: PatchType) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            patch_type,
            deprecated: false,
            title: None,
        }
    }

    /// Create a required record.
    pub fn required(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(id, path, PatchType::Required)
    }

    /// Create an optional record.
    pub fn optional(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(id, path, PatchType::Optional)
    }

    /// Mark the record as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The patch file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this is a required patch.
    pub fn is_required(&self) -> bool {
        self.patch_type == PatchType::Required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_constructors() {
        let req = PatchRecord::required("MC-1", "patches/MC-1.patch");
        assert_eq!(req.id, "MC-1");
        assert_eq!(req.patch_type, PatchType::Required);
        assert!(req.is_required());
        assert!(!req.deprecated);

        let opt = PatchRecord::optional("MC-2", "patches/MC-2.patch")
            .deprecated()
            .with_title("Fix cache warmup");
        assert_eq!(opt.patch_type, PatchType::Optional);
        assert!(opt.deprecated);
        assert_eq!(opt.title.as_deref(), Some("Fix cache warmup"));
    }

    #[test]
    fn test_patch_type_display() {
        assert_eq!(PatchType::Required.to_string(), "required");
        assert_eq!(PatchType::Optional.to_string(), "optional");
    }
}
