//! Tree command
use anyhow::Result;
use kiln_core::render_tree;

use super::{load_context, target_ports};

pub fn tree(port: &str) -> Result<()> {
    let ctx = load_context()?;
    let targets = target_ports(&ctx, &[port.to_string()])?;
    for target in &targets {
        print!("{}", render_tree(&ctx, target)?);
    }
    Ok(())
}
