//! Patch engine backed by GNU `patch`.

use super::{Backend, Direction, EngineOutput, command_exists, run_with_stdin};
use crate::error::Result;
use std::path::PathBuf;

/// Backend that runs `patch -p1` in a working directory.
pub struct GnuPatchBackend {
    work_dir: PathBuf,
    strip: u32,
}

impl GnuPatchBackend {
    /// Create a backend for `work_dir` stripping one path component.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            strip: 1,
        }
    }

    /// Override the number of leading path components to strip.
    pub fn with_strip(mut self, strip: u32) -> Self {
        self.strip = strip;
        self
    }

    fn args(&self, direction: Direction, check: bool) -> Vec<String> {
        let mut args = vec![
            format!("-p{}", self.strip),
            "--batch".to_string(),
            "--silent".to_string(),
        ];
        match direction {
            // --forward makes an already-applied patch a failure instead of
            // an implicit reverse
            Direction::Forward => args.push("--forward".to_string()),
            Direction::Reverse => args.push("--reverse".to_string()),
        }
        if check {
            args.push("--dry-run".to_string());
        } else {
            args.push("--no-backup-if-mismatch".to_string());
            args.push("--reject-file=-".to_string());
        }
        args
    }

    fn run(&self, content: &str, direction: Direction, check: bool) -> Result<EngineOutput> {
        let args = self.args(direction, check);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_with_stdin("patch", &args, &self.work_dir, content)
    }
}

impl Backend for GnuPatchBackend {
    fn name(&self) -> &'static str {
        "patch"
    }

    fn is_available(&self) -> bool {
        command_exists("patch", "--version")
    }

    fn apply(&self, content: &str, direction: Direction) -> Result<EngineOutput> {
        self.run(content, direction, false)
    }

    fn check(&self, content: &str, direction: Direction) -> Result<bool> {
        Ok(self.run(content, direction, true)?.success)
    }
}
