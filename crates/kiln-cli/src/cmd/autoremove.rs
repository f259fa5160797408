//! Autoremove command
use std::time::Instant;

use anyhow::Result;
use kiln_core::AutoremoveOptions;

use super::load_context;

/// Remove installed ports the active project no longer depends on
pub fn autoremove(options: AutoremoveOptions) -> Result<()> {
    let ctx = load_context()?;
    let reporter = ctx.reporter();
    reporter.section("Autoremoving");

    let start = Instant::now();
    let removed = kiln_core::autoremove(&ctx, options)?;
    if removed.is_empty() {
        reporter.info("Nothing to remove.");
        return Ok(());
    }
    reporter.summary(removed.len(), "removed", start.elapsed().as_secs_f64());
    Ok(())
}
