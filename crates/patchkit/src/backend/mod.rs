//! Backend abstraction for the patch engine.
//!
//! The [`Backend`] trait is the only place the working tree is touched. It
//! exposes two primitives, both taking the full diff text:
//!
//! - [`Backend::apply`] mutates the tree (forward or reverse)
//! - [`Backend::check`] is a dry run and must leave the tree untouched
//!
//! Implementations shell out to an external program and feed the diff on
//! stdin.

pub mod git;
pub mod gnu_patch;

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Direction in which a diff is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply the diff as written
    Forward,
    /// Undo a previously applied diff
    Reverse,
}

/// Raw result of an engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Whether the engine exited successfully
    pub success: bool,
    /// Exit code, when the process was not killed by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl EngineOutput {
    /// The most useful message from the engine: stderr, falling back to stdout.
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Backend trait for patch engine operations.
pub trait Backend: Send + Sync {
    /// Short engine name for logs ("git", "patch").
    fn name(&self) -> &'static str;

    /// Check if the engine executable is available.
    fn is_available(&self) -> bool;

    /// Apply (or reverse-apply) a diff to the working tree.
    ///
    /// A refused patch is reported through [`EngineOutput::success`];
    /// `Err` means the engine could not be run at all.
    fn apply(&self, content: &str, direction: Direction) -> Result<EngineOutput>;

    /// Dry-run: would `content` apply cleanly in `direction`?
    fn check(&self, content: &str, direction: Direction) -> Result<bool>;
}

/// Which engine implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// `git apply`
    #[default]
    Git,
    /// GNU `patch -p1`
    Patch,
}

impl EngineKind {
    /// Parse an engine name as used in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "git" => Some(EngineKind::Git),
            "patch" | "gnu-patch" => Some(EngineKind::Patch),
            _ => None,
        }
    }
}

/// Create a backend operating on `work_dir`.
pub fn for_kind(kind: EngineKind, work_dir: &Path) -> Box<dyn Backend> {
    match kind {
        EngineKind::Git => Box::new(git::GitBackend::new(work_dir)),
        EngineKind::Patch => Box::new(gnu_patch::GnuPatchBackend::new(work_dir)),
    }
}

/// Run `program` in `dir`, feeding `content` on stdin.
pub(crate) fn run_with_stdin(
    program: &str,
    args: &[&str],
    dir: &Path,
    content: &str,
) -> Result<EngineOutput> {
    log::trace!("Running {} {} in {}", program, args.join(" "), dir.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EngineNotFound(program.to_string())
            } else {
                Error::CommandFailed {
                    message: format!("failed to execute {program}: {e}"),
                    stderr: String::new(),
                }
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // The engine may exit before reading everything; its status says why.
        if let Err(e) = stdin.write_all(content.as_bytes()) {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
    }

    let output = child.wait_with_output()?;
    Ok(EngineOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Check whether `program` can be executed.
pub(crate) fn command_exists(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
