//! Applier: turns raw engine results into messages or conflict outcomes.

use crate::backend::{Backend, Direction};
use crate::content::ContentSource;
use crate::error::{Error, Result};
use crate::types::PatchRecord;

/// Engine refusal to apply a patch cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Raw engine message
    pub message: String,
    /// Engine exit code
    pub code: Option<i32>,
}

/// Result of applying one patch.
///
/// A conflict is an expected outcome, not an error: it is what triggers
/// conflict analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The patch is now in the tree
    Applied(String),
    /// The engine refused the patch
    Conflict(Conflict),
}

/// Observed state of a patch in the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    /// Reverse-applies cleanly
    Applied,
    /// Forward-applies cleanly
    NotApplied,
    /// Applies in neither direction
    Conflicting,
}

impl std::fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PatchStatus::Applied => "applied",
            PatchStatus::NotApplied => "not applied",
            PatchStatus::Conflicting => "n/a",
        };
        write!(f, "{label}")
    }
}

/// Wraps a [`Backend`] and a [`ContentSource`].
pub struct Applier<'a> {
    backend: &'a dyn Backend,
    content: &'a dyn ContentSource,
}

impl<'a> Applier<'a> {
    /// Create an applier.
    pub fn new(backend: &'a dyn Backend, content: &'a dyn ContentSource) -> Self {
        Self { backend, content }
    }

    /// The content source used to read patches.
    pub fn content(&self) -> &'a dyn ContentSource {
        self.content
    }

    /// Apply a patch.
    ///
    /// A patch that is refused but reverse-applies cleanly is already in the
    /// tree and counts as applied.
    pub fn apply(&self, record: &PatchRecord) -> Result<ApplyOutcome> {
        let content = self.content.read(record)?;
        let output = self.backend.apply(&content, Direction::Forward)?;
        if output.success {
            return Ok(ApplyOutcome::Applied(format!(
                "Patch {} has been applied",
                record.id
            )));
        }

        if self.backend.check(&content, Direction::Reverse)? {
            log::debug!("Patch {} is already present in the tree", record.id);
            return Ok(ApplyOutcome::Applied(format!(
                "Patch {} was already applied",
                record.id
            )));
        }

        Ok(ApplyOutcome::Conflict(Conflict {
            message: output.message(),
            code: output.code,
        }))
    }

    /// Revert a patch.
    ///
    /// Cleanup callers discard the result; a patch that was never applied
    /// is reported as such rather than as an error.
    pub fn revert(&self, record: &PatchRecord) -> Result<String> {
        let content = self.content.read(record)?;
        let output = self.backend.apply(&content, Direction::Reverse)?;
        if output.success {
            return Ok(format!("Patch {} has been reverted", record.id));
        }

        if self.backend.check(&content, Direction::Forward)? {
            return Ok(format!("Patch {} wasn't applied", record.id));
        }

        Err(Error::CommandFailed {
            message: format!("reverting patch {} failed", record.id),
            stderr: output.message(),
        })
    }

    /// Dry-run: would `content` apply cleanly as a unit?
    pub fn check_apply(&self, content: &str) -> Result<bool> {
        self.backend.check(content, Direction::Forward)
    }

    /// Current state of a patch in the tree.
    pub fn status(&self, record: &PatchRecord) -> Result<PatchStatus> {
        let content = self.content.read(record)?;
        if self.backend.check(&content, Direction::Reverse)? {
            Ok(PatchStatus::Applied)
        } else if self.backend.check(&content, Direction::Forward)? {
            Ok(PatchStatus::NotApplied)
        } else {
            Ok(PatchStatus::Conflicting)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, content_for};

    fn records() -> Vec<PatchRecord> {
        vec![
            PatchRecord::required("A", "A.patch"),
            PatchRecord::required("B", "B.patch"),
        ]
    }

    #[test]
    fn test_apply_success_message() {
        let backend = ScriptedBackend::new();
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        let outcome = applier.apply(&records()[0]).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied("Patch A has been applied".into()));
        assert_eq!(backend.applied(), vec!["A"]);
    }

    #[test]
    fn test_apply_already_applied() {
        let backend = ScriptedBackend::new().with_applied(&["A"]);
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        let outcome = applier.apply(&records()[0]).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied("Patch A was already applied".into()));
        assert_eq!(backend.applied(), vec!["A"]);
    }

    #[test]
    fn test_apply_conflict_carries_engine_message() {
        let backend = ScriptedBackend::new().with_conflict("A", "B").with_applied(&["A"]);
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        match applier.apply(&records()[1]).unwrap() {
            ApplyOutcome::Conflict(conflict) => {
                assert_eq!(conflict.code, Some(1));
                assert!(conflict.message.contains("patch does not apply"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_missing_content_is_error_not_conflict() {
        let backend = ScriptedBackend::new();
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        let missing = PatchRecord::required("Z", "Z.patch");
        assert!(matches!(
            applier.apply(&missing),
            Err(Error::ContentUnavailable { .. })
        ));
    }

    #[test]
    fn test_revert_outcomes() {
        let backend = ScriptedBackend::new().with_applied(&["A"]);
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        assert_eq!(applier.revert(&records()[0]).unwrap(), "Patch A has been reverted");
        assert_eq!(applier.revert(&records()[0]).unwrap(), "Patch A wasn't applied");
        assert!(backend.applied().is_empty());
    }

    #[test]
    fn test_revert_failure_is_error() {
        let backend = ScriptedBackend::new().with_broken("B");
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        assert!(applier.revert(&records()[1]).is_err());
    }

    #[test]
    fn test_status() {
        let backend = ScriptedBackend::new().with_applied(&["A"]).with_broken("B");
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        assert_eq!(applier.status(&records()[0]).unwrap(), PatchStatus::Applied);
        assert_eq!(applier.status(&records()[1]).unwrap(), PatchStatus::Conflicting);

        let backend = ScriptedBackend::new();
        let applier = Applier::new(&backend, &content);
        assert_eq!(applier.status(&records()[0]).unwrap(), PatchStatus::NotApplied);
    }

    #[test]
    fn test_check_apply_does_not_mutate() {
        let backend = ScriptedBackend::new().with_applied(&["A"]);
        let content = content_for(&records());
        let applier = Applier::new(&backend, &content);

        let first = applier.check_apply("B\n").unwrap();
        let second = applier.check_apply("B\n").unwrap();
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(backend.applied(), vec!["A"]);
        assert_eq!(backend.mutations(), 0);
    }
}
