//! Scripted in-memory patch engine for unit tests.
//!
//! Each patch's content is its id on a line of its own, so an aggregated
//! body is just the list of ids. The backend keeps a simulated tree (the
//! list of applied ids) and decides applicability from scripted rules.

use crate::backend::{Backend, Direction, EngineOutput};
use crate::content::MemoryContent;
use crate::error::Result;
use crate::types::PatchRecord;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, Once};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    broken: HashSet<String>,
    refused: HashSet<String>,
    conflicts: Vec<(String, String)>,
    answers: Mutex<VecDeque<bool>>,
    applied: Mutex<Vec<String>>,
    probes: Mutex<Vec<Vec<String>>>,
    mutations: AtomicUsize,
    calls: AtomicUsize,
    // A refused revert is followed by a forward check from the applier;
    // that check is not an analysis probe
    skip_probe: AtomicBool,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `id` cannot apply even to a clean tree.
    pub(crate) fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    /// Real applies of `id` fail while dry-runs still pass (stale tree state).
    pub(crate) fn with_refused(mut self, id: &str) -> Self {
        self.refused.insert(id.to_string());
        self
    }

    /// `a` and `b` cannot both be in the tree.
    pub(crate) fn with_conflict(mut self, a: &str, b: &str) -> Self {
        self.conflicts.push((a.to_string(), b.to_string()));
        self
    }

    /// Forced results for the next forward dry-runs, consumed in order.
    pub(crate) fn with_answers(self, answers: &[bool]) -> Self {
        self.answers.lock().unwrap().extend(answers.iter().copied());
        self
    }

    pub(crate) fn with_applied(self, ids: &[&str]) -> Self {
        *self.applied.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    /// Forward dry-run probes in call order, excluding the checks the
    /// applier makes after a refused revert.
    pub(crate) fn probes(&self) -> Vec<Vec<String>> {
        self.probes.lock().unwrap().clone()
    }

    pub(crate) fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn forward_ok(&self, ids: &[String]) -> bool {
        let applied = self.applied.lock().unwrap();
        if ids.is_empty() {
            return true;
        }
        if ids.iter().any(|id| self.broken.contains(id) || applied.contains(id)) {
            return false;
        }
        let combined: HashSet<&str> = applied
            .iter()
            .chain(ids.iter())
            .map(String::as_str)
            .collect();
        !self
            .conflicts
            .iter()
            .any(|(a, b)| combined.contains(a.as_str()) && combined.contains(b.as_str()))
    }

    fn reverse_ok(&self, ids: &[String]) -> bool {
        let applied = self.applied.lock().unwrap();
        !ids.is_empty() && ids.iter().all(|id| applied.contains(id))
    }

    fn refusal() -> EngineOutput {
        EngineOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "error: patch does not apply\n".to_string(),
        }
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn apply(&self, content: &str, direction: Direction) -> Result<EngineOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ids = Self::parse(content);
        match direction {
            Direction::Forward => {
                if ids.iter().any(|id| self.refused.contains(id)) || !self.forward_ok(&ids) {
                    return Ok(Self::refusal());
                }
                self.applied.lock().unwrap().extend(ids);
            }
            Direction::Reverse => {
                if !self.reverse_ok(&ids) {
                    self.skip_probe.store(true, Ordering::SeqCst);
                    return Ok(Self::refusal());
                }
                self.applied.lock().unwrap().retain(|id| !ids.contains(id));
            }
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(EngineOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        })
    }

    fn check(&self, content: &str, direction: Direction) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ids = Self::parse(content);
        match direction {
            Direction::Forward => {
                if self.skip_probe.swap(false, Ordering::SeqCst) {
                    return Ok(self.forward_ok(&ids));
                }
                self.probes.lock().unwrap().push(ids.clone());
                if let Some(answer) = self.answers.lock().unwrap().pop_front() {
                    return Ok(answer);
                }
                Ok(self.forward_ok(&ids))
            }
            Direction::Reverse => Ok(self.reverse_ok(&ids)),
        }
    }
}

/// Memory content where each record's diff is its id.
pub(crate) fn content_for(records: &[PatchRecord]) -> MemoryContent {
    let mut content = MemoryContent::new();
    for record in records {
        content.insert(&record.path, format!("{}\n", record.id));
    }
    content
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String, String)>> = const { RefCell::new(Vec::new()) };
}

/// Logger that keeps records per thread, so parallel tests stay apart.
struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|c| {
            c.borrow_mut().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Start capturing log records emitted on the current thread.
pub(crate) fn capture_logs() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Captured records at info or above whose target starts with `prefix`,
/// rendered as `LEVEL message`.
pub(crate) fn captured_logs(prefix: &str) -> Vec<String> {
    CAPTURED.with(|c| {
        c.borrow()
            .iter()
            .filter(|(level, target, _)| *level <= log::Level::Info && target.starts_with(prefix))
            .map(|(level, _, message)| format!("{level} {message}"))
            .collect()
    })
}
