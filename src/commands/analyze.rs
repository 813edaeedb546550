use anyhow::Result;
use patchkit::{Diagnosis, OptionalAnalyzer, RequiredAnalyzer};

use super::Session;
use crate::Context;
use crate::{progress, ui};

/// Run conflict analysis for one patch and print the findings.
///
/// This reverts every required patch first, like a failed apply does.
pub fn run(ctx: &Context, id: &str, optional: bool, filter: &[String]) -> Result<()> {
    let session = Session::open(ctx)?;
    session.ensure_engine()?;
    if session.catalog.find(id).is_none() {
        return Err(patchkit::Error::UnknownPatch(id.to_string()).into());
    }

    let applier = session.applier();
    let required = RequiredAnalyzer::new(&applier, &session.catalog);

    if optional && !session.environment().is_managed_cloud() {
        ui::warn("Optional analysis only runs on managed instances (see --environment)");
    }

    let pb = progress::spinner(&format!("Analyzing conflicts for {id}..."), ctx.quiet);
    let diagnosis = if optional {
        OptionalAnalyzer::new(&applier, &session.catalog, session.environment(), &required)
            .analyze(id, filter)
    } else {
        required.analyze(id)
    };
    progress::finish_clear(&pb);

    print_diagnosis(&diagnosis);
    Ok(())
}

fn print_diagnosis(diagnosis: &Diagnosis) {
    ui::header(&format!("Conflict analysis: {}", diagnosis.failing()));
    if diagnosis.is_empty() {
        ui::info("No conflict found");
        return;
    }
    for line in diagnosis.message().lines() {
        ui::warn(line);
    }
    if diagnosis.is_inconclusive() {
        ui::warn("No single patch explains the failure");
    }
    let conflicting = diagnosis.conflicting_ids();
    if !conflicting.is_empty() {
        ui::kv("Conflicting", &conflicting.join(", "));
    }
}
