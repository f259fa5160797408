//! Dependency graph walker.
//!
//! Edges of a port are its dev dependencies (always built for the host)
//! followed by its runtime dependencies (which inherit host-ness from a host
//! parent). A host port listing itself as a dev dependency is skipped.
//!
//! Graph identity is a [`NodeKey`]: the same `name@version` is a different
//! node when built for the host, so a toolchain and a same-named target
//! library never share state.

use std::collections::HashSet;
use std::fmt;

use kiln_schema::{NameVersion, PortFlags};
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::port::Port;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Runtime,
    Dev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Ports built for the target platform.
    Runtime,
    /// Ports built for the host (dev dependencies and their closure).
    Dev,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub namespace: Namespace,
    pub name_version: NameVersion,
}

impl NodeKey {
    pub fn new(nv: &NameVersion, flags: PortFlags) -> Self {
        Self {
            namespace: if flags.is_host() {
                Namespace::Dev
            } else {
                Namespace::Runtime
            },
            name_version: nv.clone(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::Runtime => write!(f, "{}", self.name_version),
            Namespace::Dev => write!(f, "{}@dev", self.name_version),
        }
    }
}

/// One outgoing dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<'a> {
    pub kind: EdgeKind,
    pub name_version: &'a NameVersion,
    pub flags: PortFlags,
}

/// Outgoing edges of `port`: dev dependencies first, then runtime ones.
pub fn edges(port: &Port) -> Vec<Edge<'_>> {
    let flags = port.flags();
    let matched = port.matched();
    let dev = matched
        .dev_dependencies()
        .iter()
        .filter(|nv| !(port.is_host() && *nv == port.name_version()))
        .map(|nv| Edge {
            kind: EdgeKind::Dev,
            name_version: nv,
            flags: flags.for_dev_dependency(),
        });
    let runtime = matched.dependencies().iter().map(|nv| Edge {
        kind: EdgeKind::Runtime,
        name_version: nv,
        flags: flags.for_dependency(),
    });
    dev.chain(runtime).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct DependencyWalker<'a> {
    ctx: &'a Context,
}

impl<'a> DependencyWalker<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Resolve every child of `port`, in edge order.
    pub fn children(&self, port: &Port) -> Result<Vec<(EdgeKind, Port)>> {
        edges(port)
            .into_iter()
            .map(|edge| {
                let child = Port::init(
                    self.ctx,
                    edge.name_version,
                    edge.flags,
                    Some(port.name_version()),
                )?;
                Ok((edge.kind, child))
            })
            .collect()
    }

    /// Visit every edge reachable from `roots`.
    ///
    /// `visit(parent, kind, child)` is called once per edge, including edges
    /// into nodes already explored; each node is only descended into once.
    pub fn walk<F>(&self, roots: &[Port], mut visit: F) -> Result<()>
    where
        F: FnMut(&Port, EdgeKind, &Port) -> Result<()>,
    {
        let mut seen = HashSet::new();
        for root in roots {
            self.walk_from(root, &mut seen, &mut visit)?;
        }
        Ok(())
    }

    fn walk_from<F>(&self, port: &Port, seen: &mut HashSet<NodeKey>, visit: &mut F) -> Result<()>
    where
        F: FnMut(&Port, EdgeKind, &Port) -> Result<()>,
    {
        if !seen.insert(port.key()) {
            return Ok(());
        }
        for (kind, child) in self.children(port)? {
            visit(port, kind, &child)?;
            self.walk_from(&child, seen, visit)?;
        }
        Ok(())
    }

    /// Every port reachable from `roots`, roots included, once each.
    pub fn closure(&self, roots: &[Port]) -> Result<Vec<Port>> {
        let mut ports: Vec<Port> = Vec::new();
        let mut keys = HashSet::new();
        for root in roots {
            if keys.insert(root.key()) {
                ports.push(root.clone());
            }
        }
        self.walk(roots, |_, _, child| {
            if keys.insert(child.key()) {
                ports.push(child.clone());
            }
            Ok(())
        })?;
        debug!(roots = roots.len(), ports = ports.len(), "collected closure");
        Ok(ports)
    }
}
