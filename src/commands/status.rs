use anyhow::Result;
use colored::Colorize;
use patchkit::{Orchestrator, PatchStatus, PatchType};

use super::Session;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    session.ensure_engine()?;

    let applier = session.applier();
    let orchestrator = Orchestrator::new(&applier, &session.catalog, session.environment());
    let states = orchestrator.status()?;

    ui::header("Patch Status");
    ui::kv("Catalog", &ctx.options.catalog.display().to_string());
    ui::kv("Working tree", &session.work_dir.display().to_string());
    ui::kv(
        "Managed instance",
        if session.environment().is_managed_cloud() {
            "yes"
        } else {
            "no"
        },
    );

    let width = states.iter().map(|(r, _)| r.id.len()).max().unwrap_or(0);
    for patch_type in [PatchType::Required, PatchType::Optional] {
        let rows: Vec<_> = states
            .iter()
            .filter(|(r, _)| r.patch_type == patch_type)
            .collect();
        if rows.is_empty() {
            continue;
        }

        ui::section(&format!("{} ({})", capitalize(patch_type.as_str()), rows.len()));
        for (record, status) in rows {
            let mut line = format!(
                "  {} {:width$}  {}",
                symbol(*status),
                record.id,
                ui::status_label(*status)
            );
            if record.deprecated {
                line.push_str(&format!(" {}", "(deprecated)".yellow()));
            }
            println!("{line}");
            if ctx.verbose > 0 {
                if let Some(title) = &record.title {
                    ui::dim(title);
                }
                ui::dim(&record.path.display().to_string());
            }
        }
    }

    let applied = states
        .iter()
        .filter(|(_, s)| *s == PatchStatus::Applied)
        .count();
    println!();
    ui::info(&format!("{applied} of {} applied", ui::patches(states.len())));
    Ok(())
}

fn symbol(status: PatchStatus) -> colored::ColoredString {
    match status {
        PatchStatus::Applied => "●".green(),
        PatchStatus::NotApplied => "○".dimmed(),
        PatchStatus::Conflicting => "✗".red(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
