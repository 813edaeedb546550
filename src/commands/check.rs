use anyhow::{Context as _, Result, bail};
use patchkit::{Probe, tree};

use super::Session;
use crate::Context;
use crate::ui;

/// Dry-run `ids` together, in the given order.
///
/// The working tree checksum is taken before and after so a misbehaving
/// engine cannot silently modify the tree.
pub fn run(ctx: &Context, ids: &[String]) -> Result<()> {
    let session = Session::open(ctx)?;
    session.ensure_engine()?;
    if let Some(unknown) = ids.iter().find(|id| session.catalog.find(id).is_none()) {
        return Err(patchkit::Error::UnknownPatch(unknown.clone()).into());
    }

    let before = tree::checksum(&session.work_dir).context("Could not hash working tree")?;
    let applier = session.applier();
    let applies = Probe::new(&applier, &session.catalog).is_applicable(ids)?;
    let after = tree::checksum(&session.work_dir).context("Could not hash working tree")?;

    if before != after {
        bail!("Working tree changed during dry-run ({} engine)", session.engine_name());
    }
    log::debug!("Tree checksum {}", after.to_hex());

    if applies {
        if !ctx.quiet {
            ui::success(&format!("{} apply cleanly: {}", ui::patches(ids.len()), ids.join(" ")));
        }
        Ok(())
    } else {
        bail!("{} do not apply together: {}", ui::patches(ids.len()), ids.join(" "))
    }
}
