//! Subcommand implementations.

pub mod analyze;
pub mod apply;
pub mod check;
pub mod revert;
pub mod status;

use anyhow::{Context as _, Result};
use indicatif::ProgressBar;
use patchkit::{Applier, Backend, Catalog, Environment, FsContent, PatchRecord, Reporter};
use std::path::PathBuf;

use crate::Context;
use crate::{progress, ui};

/// Everything a command needs to talk to one working tree.
pub struct Session {
    pub catalog: Catalog,
    pub work_dir: PathBuf,
    backend: Box<dyn Backend>,
    content: FsContent,
    environment: Box<dyn Environment>,
}

impl Session {
    /// Load the catalog and set up the configured engine.
    pub fn open(ctx: &Context) -> Result<Self> {
        let options = &ctx.options;
        let catalog = Catalog::load(&options.catalog)
            .with_context(|| format!("Could not load catalog {}", options.catalog.display()))?;
        let content = FsContent::new(catalog.base_dir());
        let backend = patchkit::backend::for_kind(options.engine, &options.work_dir);
        log::debug!(
            "Using {} engine in {}",
            backend.name(),
            options.work_dir.display()
        );

        Ok(Self {
            catalog,
            work_dir: options.work_dir.clone(),
            backend,
            content,
            environment: options.environment(),
        })
    }

    /// Fail early when the engine binary is missing.
    pub fn ensure_engine(&self) -> Result<()> {
        if self.backend.is_available() {
            Ok(())
        } else {
            Err(patchkit::Error::EngineNotFound(self.backend.name().to_string()).into())
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn applier(&self) -> Applier<'_> {
        Applier::new(self.backend.as_ref(), &self.content)
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }
}

/// Prints run progress to the terminal.
///
/// A spinner is shown while conflict analysis runs.
pub struct ConsoleReporter {
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            progress::finish_clear(&pb);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_applied(&mut self, _record: &PatchRecord, message: &str) {
        if !self.quiet {
            ui::success(message);
        }
    }

    fn on_reverted(&mut self, _record: &PatchRecord, message: &str) {
        if !self.quiet {
            ui::info(message);
        }
    }

    fn on_failed(&mut self, record: &PatchRecord, message: &str) {
        self.stop_spinner();
        // Apply failures are rendered in full by main
        log::debug!("Patch {} failed: {message}", record.id);
    }

    fn on_analyzing(&mut self, record: &PatchRecord) {
        self.spinner = Some(progress::spinner(
            &format!("Analyzing conflict for {}...", record.id),
            self.quiet,
        ));
    }
}
