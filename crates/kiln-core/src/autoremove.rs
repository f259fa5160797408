//! Installed-port enumeration and autoremove.
//!
//! Both work from trace records, so they see what is on disk rather than
//! what the configuration currently says.

use std::collections::HashSet;

use kiln_schema::{NameVersion, PortFlags};
use tracing::{info, warn};

use crate::context::Context;
use crate::error::{KilnError, Result};
use crate::graph::{DependencyWalker, NodeKey};
use crate::port::Port;
use crate::remove::{RemoveOptions, Remover, uninstall_record};
use crate::trace::TraceStore;

/// A port with a trace record in the current target tree or the host tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPort {
    pub name_version: NameVersion,
    pub library_folder: String,
    pub host: bool,
}

impl InstalledPort {
    pub fn key(&self) -> NodeKey {
        let flags = if self.host {
            PortFlags::DEV
        } else {
            PortFlags::TARGET
        };
        NodeKey::new(&self.name_version, flags)
    }
}

/// Ports installed for the current platform, project and build type, then
/// those installed in the host tree.
pub fn installed_ports(ctx: &Context) -> Result<Vec<InstalledPort>> {
    let traces = TraceStore::new(ctx.workspace());
    let mut ports = Vec::new();
    for (folder, host) in [
        (ctx.library_folder(PortFlags::TARGET), false),
        (ctx.host_folder(), true),
    ] {
        for nv in traces.list(&folder)? {
            ports.push(InstalledPort {
                name_version: nv,
                library_folder: folder.clone(),
                host,
            });
        }
    }
    Ok(ports)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoremoveOptions {
    pub purge: bool,
    pub build_cache: bool,
}

/// Remove every installed port the current project no longer needs.
///
/// Needed means reachable from the project's ports through dependencies or
/// dev dependencies. Removal is not recursive: each unneeded port is
/// considered on its own. Returns the removed ports.
pub fn autoremove(ctx: &Context, options: AutoremoveOptions) -> Result<Vec<InstalledPort>> {
    let roots = ctx
        .project()
        .ports()
        .iter()
        .map(|nv| Port::target(ctx, nv))
        .collect::<Result<Vec<_>>>()?;
    let needed: HashSet<NodeKey> = DependencyWalker::new(ctx)
        .closure(&roots)?
        .iter()
        .map(Port::key)
        .collect();

    let mut remover = Remover::new(
        ctx,
        RemoveOptions {
            purge: options.purge,
            recurse: false,
            build_cache: options.build_cache,
        },
    );

    let mut removed = Vec::new();
    for installed in installed_ports(ctx)? {
        if needed.contains(&installed.key()) {
            continue;
        }
        let flags = if installed.host {
            PortFlags::DEV
        } else {
            PortFlags::TARGET
        };
        match Port::init(ctx, &installed.name_version, flags, None) {
            Ok(port) => remover.remove(&port)?,
            Err(KilnError::PortNotFound(_) | KilnError::NoMatchedConfigFound { .. }) => {
                warn!(port = %installed.name_version, "port is no longer defined, removing by trace");
                ctx.reporter().removing(&installed.name_version);
                uninstall_record(ctx, &installed.name_version, &installed.library_folder)?;
                ctx.reporter().removed(&installed.name_version);
            }
            Err(e) => return Err(e),
        }
        info!(port = %installed.name_version, "autoremoved");
        removed.push(installed);
    }
    Ok(removed)
}
