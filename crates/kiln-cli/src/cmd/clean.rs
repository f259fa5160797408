//! Clean command
use std::time::Instant;

use anyhow::{Context as _, Result};
use kiln_schema::NameVersion;

use super::load_context;

/// Delete build dirs and build logs of ports, the active project, or every
/// port under buildtrees.
pub fn clean(ports: &[String], recurse: bool, dev: bool, all: bool) -> Result<()> {
    let ctx = load_context()?;
    let reporter = ctx.reporter();
    reporter.section("Cleaning");
    let start = Instant::now();

    let cleaned: Vec<String> = if all {
        kiln_core::clean_all(&ctx)?
            .iter()
            .map(ToString::to_string)
            .collect()
    } else if ports.is_empty() {
        if ctx.project().ports().is_empty() {
            anyhow::bail!(
                "No ports given and project '{}' lists none",
                ctx.project().name()
            );
        }
        kiln_core::clean_project(&ctx, recurse)?
            .iter()
            .map(ToString::to_string)
            .collect()
    } else {
        let mut cleaned = Vec::new();
        for spec in ports {
            let nv = NameVersion::parse(spec).with_context(|| format!("Invalid port '{spec}'"))?;
            for key in kiln_core::clean(&ctx, &nv, dev, recurse)? {
                let key = key.to_string();
                if !cleaned.contains(&key) {
                    cleaned.push(key);
                }
            }
        }
        cleaned
    };

    if cleaned.is_empty() {
        reporter.info("Nothing to clean.");
        return Ok(());
    }
    for key in &cleaned {
        reporter.success(key);
    }
    reporter.summary(cleaned.len(), "cleaned", start.elapsed().as_secs_f64());
    Ok(())
}
