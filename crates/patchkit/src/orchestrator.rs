//! Patch runs: the required apply loop, optional apply and revert.
//!
//! The orchestrator drives an [`Applier`] over the catalog. The first
//! conflict aborts the run; before returning, the matching analyzer is run
//! and its diagnosis is attached to [`Error::ApplyFailed`].

use crate::analyzer::{Diagnosis, OptionalAnalyzer, RequiredAnalyzer};
use crate::applier::{ApplyOutcome, Applier, Conflict, PatchStatus};
use crate::catalog::Catalog;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::types::PatchRecord;

/// Receives per-patch progress from a run.
///
/// Implement this to render progress; logging happens regardless.
pub trait Reporter {
    /// A patch is in the tree
    fn on_applied(&mut self, record: &PatchRecord, message: &str);

    /// A patch was reverted, or found not applied
    fn on_reverted(&mut self, record: &PatchRecord, message: &str);

    /// A patch could not be applied or reverted
    fn on_failed(&mut self, record: &PatchRecord, message: &str);

    /// Conflict analysis is about to start for `record`
    fn on_analyzing(&mut self, _record: &PatchRecord) {}
}

/// No-op reporter
pub struct NoReport;

impl Reporter for NoReport {
    fn on_applied(&mut self, _record: &PatchRecord, _message: &str) {}
    fn on_reverted(&mut self, _record: &PatchRecord, _message: &str) {}
    fn on_failed(&mut self, _record: &PatchRecord, _message: &str) {}
}

/// One patch handled by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    /// Patch id
    pub id: String,
    /// Message from the applier
    pub message: String,
}

/// Patches applied by a successful run, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Applied patches
    pub applied: Vec<PatchEntry>,
}

impl ApplyReport {
    /// Ids of the applied patches.
    pub fn ids(&self) -> Vec<&str> {
        self.applied.iter().map(|e| e.id.as_str()).collect()
    }

    fn push(&mut self, record: &PatchRecord, message: String) {
        self.applied.push(PatchEntry {
            id: record.id.clone(),
            message,
        });
    }
}

/// Outcome of a revert run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertReport {
    /// Patches reverted or found not applied, in revert order
    pub reverted: Vec<PatchEntry>,
    /// Patches whose revert failed, with the error text
    pub failed: Vec<PatchEntry>,
}

impl RevertReport {
    /// Whether every revert succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs patches from a catalog against one working tree.
pub struct Orchestrator<'a> {
    applier: &'a Applier<'a>,
    catalog: &'a Catalog,
    environment: &'a dyn Environment,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator.
    pub fn new(
        applier: &'a Applier<'a>,
        catalog: &'a Catalog,
        environment: &'a dyn Environment,
    ) -> Self {
        Self {
            applier,
            catalog,
            environment,
        }
    }

    /// Apply every required patch in catalog order.
    ///
    /// Stops at the first conflict and returns [`Error::ApplyFailed`] with
    /// the required conflict diagnosis. Errors that are not conflicts are
    /// returned as-is without analysis.
    pub fn apply_required(&self, reporter: &mut dyn Reporter) -> Result<ApplyReport> {
        log::info!("Start of applying required patches");
        let mut report = ApplyReport::default();

        for record in self.catalog.list_required() {
            match self.applier.apply(record)? {
                ApplyOutcome::Applied(message) => {
                    log::info!("{message} ({})", record.path.display());
                    reporter.on_applied(record, &message);
                    report.push(record, message);
                }
                ApplyOutcome::Conflict(conflict) => {
                    log::error!("Conflict happened");
                    reporter.on_analyzing(record);
                    let diagnosis =
                        RequiredAnalyzer::new(self.applier, self.catalog).analyze(&record.id);
                    reporter.on_failed(record, &conflict.message);
                    return Err(self.failure(record, conflict, &diagnosis));
                }
            }
        }

        log::info!("End of applying required patches");
        Ok(report)
    }

    /// Apply the required patches, then the optional patches in `ids`.
    ///
    /// Every id must name an optional patch; required ids are rejected with
    /// [`Error::NotOptional`]. Optional patches go in catalog order. On a conflict, the optional
    /// patches applied by this call are reverted (last first) and the
    /// optional analyzer runs with `ids` as its candidate filter.
    pub fn apply_optional(
        &self,
        ids: &[String],
        reporter: &mut dyn Reporter,
    ) -> Result<ApplyReport> {
        self.ensure_optional(ids)?;

        let mut report = self.apply_required(reporter)?;
        let mut step: Vec<&PatchRecord> = Vec::new();

        log::info!("Start of applying optional patches");
        for record in self.catalog.list_optional(Some(ids)) {
            if record.deprecated {
                log::warn!("Patch {} is deprecated", record.id);
            }
            match self.applier.apply(record)? {
                ApplyOutcome::Applied(message) => {
                    log::info!("{message} ({})", record.path.display());
                    reporter.on_applied(record, &message);
                    report.push(record, message);
                    step.push(record);
                }
                ApplyOutcome::Conflict(conflict) => {
                    log::error!("Conflict happened");
                    self.rollback(&step, reporter);
                    reporter.on_analyzing(record);
                    let required = RequiredAnalyzer::new(self.applier, self.catalog);
                    let diagnosis =
                        OptionalAnalyzer::new(self.applier, self.catalog, self.environment, &required)
                            .analyze(&record.id, ids);
                    reporter.on_failed(record, &conflict.message);
                    return Err(self.failure(record, conflict, &diagnosis));
                }
            }
        }
        log::info!("End of applying optional patches");

        Ok(report)
    }

    /// Revert patches in reverse catalog order.
    ///
    /// `None` selects every patch in the catalog. A failed revert is
    /// reported and the run continues with the next patch.
    pub fn revert(
        &self,
        ids: Option<&[String]>,
        reporter: &mut dyn Reporter,
    ) -> Result<RevertReport> {
        if let Some(ids) = ids {
            self.ensure_known(ids)?;
        }

        let selected: Vec<&PatchRecord> = self
            .catalog
            .iter()
            .filter(|r| ids.is_none_or(|ids| ids.contains(&r.id)))
            .collect();

        let mut report = RevertReport::default();
        for record in selected.into_iter().rev() {
            match self.applier.revert(record) {
                Ok(message) => {
                    log::info!("{message}");
                    reporter.on_reverted(record, &message);
                    report.reverted.push(PatchEntry {
                        id: record.id.clone(),
                        message,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    log::warn!("Reverting patch {} failed: {message}", record.id);
                    reporter.on_failed(record, &message);
                    report.failed.push(PatchEntry {
                        id: record.id.clone(),
                        message,
                    });
                }
            }
        }
        Ok(report)
    }

    /// State of every patch in the catalog, required first.
    pub fn status(&self) -> Result<Vec<(&'a PatchRecord, PatchStatus)>> {
        self.catalog
            .iter()
            .map(|record| Ok((record, self.applier.status(record)?)))
            .collect()
    }

    fn ensure_known(&self, ids: &[String]) -> Result<()> {
        match ids.iter().find(|id| self.catalog.find(id).is_none()) {
            Some(unknown) => Err(Error::UnknownPatch(unknown.clone())),
            None => Ok(()),
        }
    }

    fn ensure_optional(&self, ids: &[String]) -> Result<()> {
        self.ensure_known(ids)?;
        match ids.iter().find(|id| self.catalog.optional().get(id).is_none()) {
            Some(required) => Err(Error::NotOptional(required.clone())),
            None => Ok(()),
        }
    }

    fn rollback(&self, step: &[&PatchRecord], reporter: &mut dyn Reporter) {
        for record in step.iter().rev() {
            match self.applier.revert(record) {
                Ok(message) => reporter.on_reverted(record, &message),
                Err(e) => log::debug!("Rollback of {} failed: {e}", record.id),
            }
        }
    }

    fn failure(&self, record: &PatchRecord, conflict: Conflict, diagnosis: &Diagnosis) -> Error {
        Error::ApplyFailed {
            id: record.id.clone(),
            path: self.catalog.base_dir().join(record.path()),
            message: conflict.message,
            code: conflict.code,
            details: diagnosis.message(),
        }
    }
}
