//! Patch engine backed by `git apply`.

use super::{Backend, Direction, EngineOutput, command_exists, run_with_stdin};
use crate::error::Result;
use std::path::PathBuf;

/// Backend that runs `git apply` in a working directory.
///
/// Works both inside and outside a git repository; outside one `git apply`
/// behaves like a stricter `patch -p1`.
pub struct GitBackend {
    work_dir: PathBuf,
}

impl GitBackend {
    /// Create a backend for `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn args(direction: Direction, check: bool) -> Vec<&'static str> {
        let mut args = vec!["apply"];
        if direction == Direction::Reverse {
            args.push("--reverse");
        }
        if check {
            args.push("--check");
        }
        args.push("-");
        args
    }
}

impl Backend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn is_available(&self) -> bool {
        command_exists("git", "--version")
    }

    fn apply(&self, content: &str, direction: Direction) -> Result<EngineOutput> {
        run_with_stdin("git", &Self::args(direction, false), &self.work_dir, content)
    }

    fn check(&self, content: &str, direction: Direction) -> Result<bool> {
        let output = run_with_stdin("git", &Self::args(direction, true), &self.work_dir, content)?;
        if !output.success {
            log::trace!("git apply --check rejected content: {}", output.message());
        }
        Ok(output.success)
    }
}
