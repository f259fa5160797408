//! Command implementations, one module per subcommand.

pub mod autoremove;
pub mod clean;
pub mod configure;
pub mod install;
pub mod list;
pub mod remove;
pub mod reverse;
pub mod tree;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use kiln_core::paths::try_workspace_root;
use kiln_core::{Context, Port, Workspace};
use kiln_schema::NameVersion;

use crate::ui::Output;

/// Resolve the workspace from `KILN_WORKSPACE` or the current dir.
pub fn workspace() -> Result<Workspace> {
    let root = try_workspace_root().context("Failed to determine the kiln workspace")?;
    Ok(Workspace::new(root))
}

/// Load the context of the current workspace, reporting to the terminal.
pub fn load_context() -> Result<Context> {
    let ws = workspace()?;
    let ctx = Context::load(ws).context("Failed to load kiln.toml")?;
    Ok(ctx.with_reporter(Arc::new(Output::new())))
}

/// Parse `name@version` arguments into target ports.
pub fn target_ports(ctx: &Context, specs: &[String]) -> Result<Vec<Port>> {
    specs
        .iter()
        .map(|spec| {
            let nv = NameVersion::parse(spec).with_context(|| format!("Invalid port '{spec}'"))?;
            Ok(Port::target(ctx, &nv)?)
        })
        .collect()
}
