//! Conflict analysis.
//!
//! When a patch fails to apply, the analyzers work out which other patch it
//! is incompatible with, using nothing but dry-run checks of aggregated
//! patch bodies:
//!
//! - [`RequiredAnalyzer`] reverts the required patches and eliminates
//!   candidates from the tail until the aggregate applies
//! - [`OptionalAnalyzer`] additionally probes the failing patch pairwise
//!   against optional patches (managed cloud instances only)
//!
//! Analysis is best effort. A probe that cannot run yields an empty
//! [`Diagnosis`] instead of an error, since the run is failing anyway.

pub mod optional;
pub mod required;

pub use optional::OptionalAnalyzer;
pub use required::RequiredAnalyzer;

use crate::applier::Applier;
use crate::catalog::Catalog;
use crate::error::Result;

/// A single conclusion about a failing patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// The failing patch cannot coexist with this required patch
    RequiredConflict {
        /// Id of the conflicting required patch
        conflicting: String,
    },
    /// The failing patch does not apply even to a clean tree
    CannotApplyClean,
    /// The failing patch cannot coexist with these optional patches
    OptionalConflicts {
        /// Ids of the conflicting optional patches, in probe order
        conflicting: Vec<String>,
    },
    /// Nothing explains the failure: the required set conflicts as a whole,
    /// yet no single removal fixes it and the patch applies on its own
    Inconclusive,
}

impl Finding {
    /// User-facing text; `None` for findings that carry no message.
    pub fn message(&self, failing: &str) -> Option<String> {
        match self {
            Finding::RequiredConflict { conflicting } => Some(format!(
                "Patch {failing} is not compatible with required: {conflicting}"
            )),
            Finding::CannotApplyClean => {
                Some(format!("Patch {failing} can't be applied to clean instance"))
            }
            Finding::OptionalConflicts { conflicting } => Some(format!(
                "Patch {failing} is not compatible with optional: {}",
                conflicting.join(" ")
            )),
            Finding::Inconclusive => None,
        }
    }
}

/// Outcome of analysing one failing patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    failing: String,
    findings: Vec<Finding>,
}

impl Diagnosis {
    /// A diagnosis with no findings.
    pub fn empty(failing: impl Into<String>) -> Self {
        Self {
            failing: failing.into(),
            findings: Vec::new(),
        }
    }

    /// A diagnosis with a single finding.
    pub fn with(failing: impl Into<String>, finding: Finding) -> Self {
        let mut diagnosis = Self::empty(failing);
        diagnosis.push(finding);
        diagnosis
    }

    /// Id of the patch being diagnosed.
    pub fn failing(&self) -> &str {
        &self.failing
    }

    /// All findings in the order they were made.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Add a finding.
    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Whether there are no findings at all.
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Whether the analysis ran but could not explain the failure.
    pub fn is_inconclusive(&self) -> bool {
        self.findings.contains(&Finding::Inconclusive)
    }

    /// Ids of every conflicting patch found.
    pub fn conflicting_ids(&self) -> Vec<&str> {
        self.findings
            .iter()
            .flat_map(|f| match f {
                Finding::RequiredConflict { conflicting } => vec![conflicting.as_str()],
                Finding::OptionalConflicts { conflicting } => {
                    conflicting.iter().map(String::as_str).collect()
                }
                _ => Vec::new(),
            })
            .collect()
    }

    /// Newline-joined finding messages; empty when nothing is known.
    pub fn message(&self) -> String {
        self.findings
            .iter()
            .filter_map(|f| f.message(&self.failing))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Dry-run probe over aggregated patch bodies.
///
/// Both analyzers are built on this; it is also usable directly to check
/// whether a set of patches applies together.
pub struct Probe<'a> {
    applier: &'a Applier<'a>,
    catalog: &'a Catalog,
}

impl<'a> Probe<'a> {
    /// Create a probe resolving ids through `catalog`.
    pub fn new(applier: &'a Applier<'a>, catalog: &'a Catalog) -> Self {
        Self { applier, catalog }
    }

    /// Concatenated contents of `ids`, in the given order. Unknown ids are
    /// skipped.
    ///
    /// Each body is terminated with a newline so a file missing its final
    /// newline cannot run into the next patch's header.
    pub fn aggregate(&self, ids: &[String]) -> Result<String> {
        let mut body = String::new();
        for id in ids {
            let Some(record) = self.catalog.find(id) else {
                log::debug!("Skipping unknown patch {id} in aggregate");
                continue;
            };
            let text = self.applier.content().read(record)?;
            body.push_str(&text);
            if !text.is_empty() && !text.ends_with('\n') {
                body.push('\n');
            }
        }
        Ok(body)
    }

    /// Whether `ids`, applied together in order, apply cleanly.
    pub fn is_applicable(&self, ids: &[String]) -> Result<bool> {
        let body = self.aggregate(ids)?;
        let ok = self.applier.check_apply(&body)?;
        log::trace!("Probe [{}] -> {}", ids.join(", "), ok);
        Ok(ok)
    }
}

/// Remove duplicates keeping the first occurrence.
pub(crate) fn dedup_ordered(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
