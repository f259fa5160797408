//! Dependency tree rendering.

use std::fmt::Write as _;

use crate::context::Context;
use crate::depcheck::DepCheck;
use crate::error::Result;
use crate::graph::{DependencyWalker, EdgeKind};
use crate::port::Port;

/// Render the dependency tree of `port`, dev edges marked `[dev]`.
///
/// Fails like [`DepCheck::check_circular`] when the graph has a cycle.
pub fn render_tree(ctx: &Context, port: &Port) -> Result<String> {
    DepCheck::new(ctx).check_circular(port)?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", port.name_version());
    render_children(&DependencyWalker::new(ctx), port, "", &mut out)?;
    Ok(out)
}

fn render_children(walker: &DependencyWalker<'_>, port: &Port, prefix: &str, out: &mut String) -> Result<()> {
    let children = walker.children(port)?;
    let count = children.len();
    for (i, (kind, child)) in children.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        let marker = match kind {
            EdgeKind::Dev => " [dev]",
            EdgeKind::Runtime => "",
        };
        let _ = writeln!(out, "{prefix}{branch}{}{marker}", child.name_version());

        let next = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_children(walker, child, &next, out)?;
    }
    Ok(())
}
