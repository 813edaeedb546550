use anyhow::{Result, bail};
use patchkit::Orchestrator;

use super::{ConsoleReporter, Session};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, ids: &[String], all: bool) -> Result<()> {
    if ids.is_empty() && !all {
        bail!("Specify patch ids to revert, or --all");
    }

    let session = Session::open(ctx)?;
    session.ensure_engine()?;

    let applier = session.applier();
    let orchestrator = Orchestrator::new(&applier, &session.catalog, session.environment());
    let mut reporter = ConsoleReporter::new(ctx.quiet);

    let selection = if all { None } else { Some(ids) };
    let report = orchestrator.revert(selection, &mut reporter)?;

    for failure in &report.failed {
        ui::error(&failure.message);
    }
    if !report.is_clean() {
        bail!("{} could not be reverted", ui::patches(report.failed.len()));
    }

    if !ctx.quiet {
        ui::success(&format!("{} processed", ui::patches(report.reverted.len())));
    }
    Ok(())
}
