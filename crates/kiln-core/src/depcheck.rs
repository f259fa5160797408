//! Dependency graph validation: cycles and version conflicts.
//!
//! Both checks run before anything is installed. A failure is fatal to the
//! calling command and is surfaced with the full chain or conflict list.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use kiln_schema::{PortName, Version};
use tracing::debug;

use crate::context::Context;
use crate::error::{KilnError, Result};
use crate::graph::{DependencyWalker, Namespace, NodeKey};
use crate::port::Port;

/// One observation of "port X required at version V by parent P".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub parent: String,
    pub version: Version,
    pub dev_dep: bool,
    pub native: bool,
}

#[derive(Debug)]
pub struct DepCheck<'a> {
    ctx: &'a Context,
    visited: HashSet<NodeKey>,
    path: Vec<NodeKey>,
}

impl<'a> DepCheck<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            visited: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Fail if any dependency or dev-dependency chain below `port` loops.
    ///
    /// Runtime and host ports live in separate namespaces, so a dev-only
    /// cycle is reported even when runtime edges are acyclic.
    pub fn check_circular(&mut self, port: &Port) -> Result<()> {
        let key = port.key();

        if self.path.contains(&key) {
            let chain = self
                .path
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(match key.namespace {
                Namespace::Runtime => KilnError::CircularDependency(chain),
                Namespace::Dev => KilnError::CircularDevDependency(chain),
            });
        }

        if !self.visited.insert(key.clone()) {
            return Ok(());
        }

        self.path.push(key);
        let result = self.check_children(port);
        self.path.pop();
        result
    }

    fn check_children(&mut self, port: &Port) -> Result<()> {
        for (_, child) in DependencyWalker::new(self.ctx).children(port)? {
            self.check_circular(&child)?;
        }
        Ok(())
    }

    /// Fail if the closure of `ports` requires any port name at more than
    /// one version. Top-level ports are attributed to the project.
    pub fn check_conflict(&self, ports: &[Port]) -> Result<()> {
        let mut infos: BTreeMap<PortName, Vec<VersionInfo>> = BTreeMap::new();
        let project = self.ctx.project().name().to_string();

        for port in ports {
            record(&mut infos, port, project.clone());
        }
        DependencyWalker::new(self.ctx).walk(ports, |parent, _, child| {
            record(&mut infos, child, parent.name_version().to_string());
            Ok(())
        })?;

        let mut report = String::new();
        for (name, versions) in &infos {
            if versions.len() < 2 {
                continue;
            }
            let line = versions
                .iter()
                .map(|info| {
                    let kind = if info.dev_dep || info.native { " as dev" } else { "" };
                    format!("{name}@{} is defined{kind} in {}", info.version, info.parent)
                })
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(report, "    - {line}");
        }

        if report.is_empty() {
            debug!(ports = infos.len(), "no version conflicts");
            return Ok(());
        }
        Err(KilnError::VersionConflict(report.trim_end().to_string()))
    }
}

fn record(infos: &mut BTreeMap<PortName, Vec<VersionInfo>>, port: &Port, parent: String) {
    let versions = infos.entry(port.name().clone()).or_default();
    if versions.iter().any(|info| info.version == *port.version()) {
        return;
    }
    let flags = port.flags();
    versions.push(VersionInfo {
        parent,
        version: port.version().clone(),
        dev_dep: flags.dev_dep,
        native: flags.native,
    });
}
