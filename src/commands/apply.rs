use anyhow::Result;
use patchkit::Orchestrator;

use super::{ConsoleReporter, Session};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    session.ensure_engine()?;

    let applier = session.applier();
    let orchestrator = Orchestrator::new(&applier, &session.catalog, session.environment());
    let mut reporter = ConsoleReporter::new(ctx.quiet);

    let report = orchestrator.apply_required(&mut reporter)?;
    if !ctx.quiet {
        ui::success(&format!(
            "{} required applied",
            ui::patches(report.applied.len())
        ));
    }
    Ok(())
}

pub fn run_optional(ctx: &Context, ids: &[String]) -> Result<()> {
    let session = Session::open(ctx)?;
    session.ensure_engine()?;

    let applier = session.applier();
    let orchestrator = Orchestrator::new(&applier, &session.catalog, session.environment());
    let mut reporter = ConsoleReporter::new(ctx.quiet);

    let report = orchestrator.apply_optional(ids, &mut reporter)?;
    if !ctx.quiet {
        let optional = report
            .applied
            .iter()
            .filter(|e| session.catalog.optional().get(&e.id).is_some())
            .count();
        ui::success(&format!(
            "{} applied ({optional} optional)",
            ui::patches(report.applied.len())
        ));
    }
    Ok(())
}
