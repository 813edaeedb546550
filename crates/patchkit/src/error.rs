//! Error types for patch operations.
//!
//! A patch that the engine refuses to apply is *not* an error at this level:
//! it is reported as [`crate::applier::ApplyOutcome::Conflict`] so callers can
//! branch into conflict analysis. Errors here are either fatal run failures
//! ([`Error::ApplyFailed`]) or problems that prevent the engine from being
//! asked at all.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a catalog or applying patches.
#[derive(Debug, Error)]
pub enum Error {
    /// A patch could not be applied; the run was aborted.
    ///
    /// `details` holds the conflict diagnosis, empty when nothing more
    /// specific could be determined.
    #[error("{}", render_apply_failed(.id, .path, .message, .details))]
    ApplyFailed {
        /// Id of the patch that failed
        id: String,
        /// Path of the failing patch file
        path: PathBuf,
        /// Raw message reported by the patch engine
        message: String,
        /// Exit code reported by the patch engine, when available
        code: Option<i32>,
        /// Conflict diagnosis text
        details: String,
    },

    /// A patch id was requested that the catalog does not contain
    #[error("unknown patch: {0}")]
    UnknownPatch(String),

    /// A required patch was passed where optional patches are expected
    #[error("patch {0} is required, not optional")]
    NotOptional(String),

    /// The same patch id is declared more than once
    #[error("duplicate patch id in catalog: {0}")]
    DuplicatePatch(String),

    /// Catalog contents are structurally invalid
    #[error("invalid catalog: {message}")]
    InvalidCatalog {
        /// What is wrong with the catalog
        message: String,
    },

    /// Catalog file does not exist
    #[error("catalog not found: {0}")]
    CatalogNotFound(PathBuf),

    /// Catalog file is not valid TOML
    #[error("invalid catalog syntax: {0}")]
    CatalogParse(#[from] toml::de::Error),

    /// The diff text for a patch could not be read
    #[error("cannot read patch {id} ({}): {source}", .path.display())]
    ContentUnavailable {
        /// Id of the patch
        id: String,
        /// Resolved path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The patch engine executable is not installed
    #[error("patch engine not found: {0}")]
    EngineNotFound(String),

    /// Engine invocation failed for a reason other than a conflict
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Apply failures carry the engine's own code through so a calling
    /// pipeline sees what `git apply` (or `patch`) reported.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ApplyFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Whether this error aborted a patch run because of a conflict.
    pub fn is_apply_failure(&self) -> bool {
        matches!(self, Error::ApplyFailed { .. })
    }
}

fn render_apply_failed(
    id: &str,
    path: &std::path::Path,
    message: &str,
    details: &str,
) -> String {
    let mut out = format!("Applying patch {id} ({}) failed.", path.display());
    let message = message.trim();
    if !message.is_empty() {
        out.push('\n');
        out.push_str(message);
    }
    if !details.is_empty() {
        out.push('\n');
        out.push_str(details);
    }
    out
}

/// Result type for patch operations.
pub type Result<T> = std::result::Result<T, Error>;
