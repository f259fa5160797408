//! Reverse command
use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use kiln_schema::NameVersion;

use super::load_context;

/// Print the ports that depend on `port`
pub fn reverse(port: &str, dev: bool) -> Result<()> {
    let nv = NameVersion::parse(port).with_context(|| format!("Invalid port '{port}'"))?;
    let ctx = load_context()?;
    let dependents = kiln_core::reverse_dependencies(&ctx, &nv, dev)
        .context("Failed to query reverse dependencies")?;

    let title = if dev {
        format!("Reverse dependencies of {nv} as dev:")
    } else {
        format!("Reverse dependencies of {nv}:")
    };
    println!("{}", title.as_str().bold());
    println!("{}", "-".repeat(title.chars().count()));

    if dependents.is_empty() {
        println!("  No reverse dependencies found.");
        return Ok(());
    }
    for dependent in &dependents {
        println!("{dependent}");
    }
    println!("{}", "-".repeat(title.chars().count()));
    println!("Total: {} port(s)", dependents.len());
    Ok(())
}
