//! Conflict analysis against optional patches.

use super::{Diagnosis, Finding, Probe, RequiredAnalyzer, dedup_ordered};
use crate::applier::Applier;
use crate::catalog::Catalog;
use crate::environment::Environment;
use crate::error::Result;
use crate::types::PatchType;

/// Extends [`RequiredAnalyzer`] with pairwise probing of optional patches.
///
/// Only active on managed cloud instances: the required analysis reverts
/// patches, which is unsafe anywhere the tree is not disposable.
pub struct OptionalAnalyzer<'a> {
    applier: &'a Applier<'a>,
    catalog: &'a Catalog,
    environment: &'a dyn Environment,
    required: &'a RequiredAnalyzer<'a>,
}

impl<'a> OptionalAnalyzer<'a> {
    /// Create an analyzer.
    pub fn new(
        applier: &'a Applier<'a>,
        catalog: &'a Catalog,
        environment: &'a dyn Environment,
        required: &'a RequiredAnalyzer<'a>,
    ) -> Self {
        Self {
            applier,
            catalog,
            environment,
            required,
        }
    }

    /// Explain why `failing` did not apply.
    ///
    /// `filter` restricts the optional patches compared against; when empty
    /// every non-deprecated optional patch is a candidate. Unlike the
    /// required analysis, every incompatible candidate is reported.
    pub fn analyze(&self, failing: &str, filter: &[String]) -> Diagnosis {
        if !self.environment.is_managed_cloud() {
            log::debug!("Skipping optional conflict analysis outside a managed instance");
            return Diagnosis::empty(failing);
        }

        let mut diagnosis = self.required.analyze(failing);
        match self.compare_optional(failing, filter) {
            Ok(findings) => {
                for finding in findings {
                    if !diagnosis.findings().contains(&finding) {
                        diagnosis.push(finding);
                    }
                }
            }
            Err(e) => log::warn!("Optional conflict analysis for {failing} aborted: {e}"),
        }
        diagnosis
    }

    fn compare_optional(&self, failing: &str, filter: &[String]) -> Result<Vec<Finding>> {
        let probe = Probe::new(self.applier, self.catalog);
        if !probe.is_applicable(&[failing.to_string()])? {
            return Ok(vec![Finding::CannotApplyClean]);
        }

        let candidates = if filter.is_empty() {
            self.optional_ids()
        } else {
            filter.to_vec()
        };

        let mut incompatible = Vec::new();
        for candidate in dedup_ordered(candidates) {
            if candidate == failing {
                continue;
            }
            if !probe.is_applicable(&[candidate.clone(), failing.to_string()])? {
                incompatible.push(candidate);
            }
        }

        if incompatible.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![Finding::OptionalConflicts {
                conflicting: incompatible,
            }])
        }
    }

    /// Ids of optional, not deprecated patches.
    fn optional_ids(&self) -> Vec<String> {
        dedup_ordered(
            self.catalog
                .list_optional(None)
                .into_iter()
                .filter(|r| !r.deprecated && r.patch_type == PatchType::Optional)
                .map(|r| r.id.clone())
                .collect(),
        )
    }
}
