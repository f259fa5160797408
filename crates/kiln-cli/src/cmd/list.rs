//! List command
use anyhow::Result;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};

use super::load_context;

/// List installed ports of the current target and host trees
pub fn list() -> Result<()> {
    let ctx = load_context()?;
    let ports = kiln_core::installed_ports(&ctx)?;

    if ports.is_empty() {
        println!();
        println!("  No ports installed.");
        println!("  Run 'kiln install <name@version>' to get started.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["name", "version", "tree"]);

    for port in &ports {
        let tree = if port.host {
            format!("{} (host)", port.library_folder)
        } else {
            port.library_folder.clone()
        };
        table.add_row(vec![
            port.name_version.name().to_string(),
            port.name_version.version().to_string(),
            tree,
        ]);
    }

    println!("{table}");
    println!("  {} port(s) installed", ports.len());
    Ok(())
}
