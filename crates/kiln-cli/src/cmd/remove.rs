//! Remove command
use std::time::Instant;

use anyhow::Result;
use kiln_core::{RemoveOptions, Remover};

use super::{load_context, target_ports};

/// Remove one or more ports
pub fn remove(ports: &[String], options: RemoveOptions) -> Result<()> {
    let ctx = load_context()?;
    let targets = target_ports(&ctx, ports)?;

    let reporter = ctx.reporter();
    reporter.section("Removing");
    let start = Instant::now();
    let mut remover = Remover::new(&ctx, options);
    for port in &targets {
        remover.remove(port)?;
    }
    reporter.summary(targets.len(), "removed", start.elapsed().as_secs_f64());
    Ok(())
}
