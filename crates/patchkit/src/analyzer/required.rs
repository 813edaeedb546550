//! Conflict analysis against the required patch set.

use super::{Diagnosis, Finding, Probe, dedup_ordered};
use crate::applier::Applier;
use crate::catalog::Catalog;
use crate::error::Result;

/// Finds the required patch a failing patch conflicts with.
///
/// The analysis reverts every required patch first, so it must only run
/// once the apply loop has already been aborted.
pub struct RequiredAnalyzer<'a> {
    applier: &'a Applier<'a>,
    catalog: &'a Catalog,
}

impl<'a> RequiredAnalyzer<'a> {
    /// Create an analyzer.
    pub fn new(applier: &'a Applier<'a>, catalog: &'a Catalog) -> Self {
        Self { applier, catalog }
    }

    /// Explain why `failing` did not apply.
    ///
    /// Steps:
    /// 1. revert all required patches, last applied first
    /// 2. probe all other required patches followed by `failing`; if that
    ///    applies there is no structural conflict
    /// 3. drop candidates from the tail one at a time; the first removal that
    ///    makes the probe pass names the conflicting patch
    /// 4. otherwise probe `failing` alone
    pub fn analyze(&self, failing: &str) -> Diagnosis {
        match self.try_analyze(failing) {
            Ok(diagnosis) => diagnosis,
            Err(e) => {
                log::warn!("Conflict analysis for {failing} aborted: {e}");
                Diagnosis::empty(failing)
            }
        }
    }

    fn try_analyze(&self, failing: &str) -> Result<Diagnosis> {
        self.cleanup();

        let probe = Probe::new(self.applier, self.catalog);
        let mut candidates: Vec<String> = dedup_ordered(self.catalog.required().ids())
            .into_iter()
            .filter(|id| id != failing)
            .collect();

        if probe.is_applicable(&with_failing(&candidates, failing))? {
            log::debug!("Required patches apply together with {failing}");
            return Ok(Diagnosis::empty(failing));
        }

        while let Some(removed) = candidates.pop() {
            if probe.is_applicable(&with_failing(&candidates, failing))? {
                return Ok(Diagnosis::with(
                    failing,
                    Finding::RequiredConflict {
                        conflicting: removed,
                    },
                ));
            }
        }

        if !probe.is_applicable(&[failing.to_string()])? {
            return Ok(Diagnosis::with(failing, Finding::CannotApplyClean));
        }

        log::warn!("Could not identify a required patch conflicting with {failing}");
        Ok(Diagnosis::with(failing, Finding::Inconclusive))
    }

    /// Revert all required patches in reverse order, best effort.
    pub fn cleanup(&self) {
        log::info!("Revert all required patches before conflict analyzing");
        for record in self.catalog.list_required().iter().rev() {
            // Not applied or already reverted: expected during cleanup
            if let Err(e) = self.applier.revert(record) {
                log::debug!("Skipped reverting {}: {e}", record.id);
            }
        }
    }
}

fn with_failing(candidates: &[String], failing: &str) -> Vec<String> {
    let mut ids = candidates.to_vec();
    ids.push(failing.to_string());
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, content_for};
    use crate::types::PatchRecord;

    fn catalog(ids: &[&str]) -> Catalog {
        let records = ids
            .iter()
            .map(|id| PatchRecord::required(*id, format!("{id}.patch")))
            .collect();
        Catalog::new(records, ".").unwrap()
    }

    fn probes(ids: &[&[&str]]) -> Vec<Vec<String>> {
        ids.iter()
            .map(|p| p.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_reports_conflict_with_tail_elimination_order() {
        let catalog = catalog(&["A", "B", "C"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new()
            .with_conflict("A", "C")
            .with_applied(&["A", "B"]);
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("C");

        assert_eq!(
            diagnosis.findings(),
            &[Finding::RequiredConflict {
                conflicting: "A".into()
            }]
        );
        assert_eq!(diagnosis.message(), "Patch C is not compatible with required: A");
        assert_eq!(
            backend.probes(),
            probes(&[&["A", "B", "C"], &["A", "C"], &["C"]])
        );
    }

    #[test]
    fn test_last_applied_conflict_wins() {
        // C conflicts with both A and B; the tail (B) is removed first but
        // A still conflicts, so A is reported
        let catalog = catalog(&["A", "B", "C"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new()
            .with_conflict("A", "C")
            .with_conflict("B", "C");
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("C");
        assert_eq!(diagnosis.conflicting_ids(), vec!["A"]);
    }

    #[test]
    fn test_conflict_with_later_patch() {
        let catalog = catalog(&["A", "B", "C", "D"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_conflict("B", "D");
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("B");
        assert_eq!(diagnosis.conflicting_ids(), vec!["D"]);
        assert_eq!(
            backend.probes(),
            probes(&[&["A", "C", "D", "B"], &["A", "C", "B"]])
        );
    }

    #[test]
    fn test_cleanup_reverts_in_reverse_order() {
        let catalog = catalog(&["A", "B", "C"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_applied(&["A", "B"]);
        let applier = Applier::new(&backend, &content);

        RequiredAnalyzer::new(&applier, &catalog).cleanup();
        assert!(backend.applied().is_empty());
    }

    #[test]
    fn test_cleanup_ignores_unapplied_patches() {
        let catalog = catalog(&["A", "B"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_broken("B");
        let applier = Applier::new(&backend, &content);

        // Neither patch is applied and B reverts in no direction: no panic,
        // no error surfaced
        RequiredAnalyzer::new(&applier, &catalog).cleanup();
        RequiredAnalyzer::new(&applier, &catalog).cleanup();
        assert!(backend.applied().is_empty());
    }

    #[test]
    fn test_no_conflict_returns_empty() {
        let catalog = catalog(&["A", "B", "C"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_refused("C");
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("C");
        assert!(diagnosis.is_empty());
        assert_eq!(diagnosis.message(), "");
        assert_eq!(backend.probes().len(), 1);
    }

    #[test]
    fn test_cannot_apply_to_clean_instance() {
        let catalog = catalog(&["A", "B", "C"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_broken("B");
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("B");
        assert_eq!(diagnosis.findings(), &[Finding::CannotApplyClean]);
        assert_eq!(diagnosis.message(), "Patch B can't be applied to clean instance");
        assert_eq!(
            backend.probes(),
            probes(&[&["A", "C", "B"], &["A", "B"], &["B"], &["B"]])
        );
    }

    #[test]
    fn test_conflict_between_other_patches_blames_tail() {
        // A and B conflict with each other, not with F; elimination still
        // blames the first removal that makes the aggregate pass
        let catalog = catalog(&["A", "B", "F"]);
        let content = content_for(catalog.list_required());
        let backend = ScriptedBackend::new().with_conflict("A", "B");
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("F");
        assert_eq!(diagnosis.conflicting_ids(), vec!["B"]);
    }

    #[test]
    fn test_inconclusive_outcome() {
        let catalog = catalog(&["A", "F"]);
        let content = content_for(catalog.list_required());
        // The tree changes under the analysis: F alone fails inside the
        // elimination loop but passes on the final check
        let backend = ScriptedBackend::new().with_answers(&[false, false, true]);
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("F");
        assert!(diagnosis.is_inconclusive());
        assert_eq!(diagnosis.message(), "");
        assert_eq!(backend.probes(), probes(&[&["A", "F"], &["F"], &["F"]]));
    }

    #[test]
    fn test_missing_content_yields_empty_diagnosis() {
        let catalog = catalog(&["A", "B"]);
        let content = content_for(&catalog.list_required()[..1]);
        let backend = ScriptedBackend::new();
        let applier = Applier::new(&backend, &content);

        let diagnosis = RequiredAnalyzer::new(&applier, &catalog).analyze("B");
        assert!(diagnosis.is_empty());
    }
}
