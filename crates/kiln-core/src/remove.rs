//! Removal engine.
//!
//! Reverses an install: deletes the files listed in the port's trace record,
//! the record itself and the installed metadata. `purge` also deletes the
//! package dir, `build_cache` the build dir and build logs, and `recurse`
//! first removes every dependency and dev dependency the same way.

use std::collections::HashSet;
use std::path::Path;

use kiln_schema::NameVersion;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{IoContext, Result};
use crate::graph::{DependencyWalker, NodeKey};
use crate::port::Port;
use crate::trace::TraceStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Also delete the package dir.
    pub purge: bool,
    /// Also remove dependencies and dev dependencies.
    pub recurse: bool,
    /// Also delete the build dir and build logs.
    pub build_cache: bool,
}

#[derive(Debug)]
pub struct Remover<'a> {
    ctx: &'a Context,
    options: RemoveOptions,
    cleaned: HashSet<NodeKey>,
}

impl<'a> Remover<'a> {
    pub fn new(ctx: &'a Context, options: RemoveOptions) -> Self {
        Self {
            ctx,
            options,
            cleaned: HashSet::new(),
        }
    }

    /// Remove `port`, dependencies first when recursing. Each graph node is
    /// removed at most once per remover.
    pub fn remove(&mut self, port: &Port) -> Result<()> {
        if !self.cleaned.insert(port.key()) {
            return Ok(());
        }

        if self.options.recurse {
            for (_, child) in DependencyWalker::new(self.ctx).children(port)? {
                self.remove(&child)?;
            }
        }

        self.remove_one(port)
    }

    fn remove_one(&self, port: &Port) -> Result<()> {
        let nv = port.name_version();
        let paths = port.paths();
        let reporter = self.ctx.reporter();
        reporter.removing(nv);

        let uninstalled = uninstall(self.ctx, port)?;

        if self.options.purge && paths.package_dir.exists() {
            std::fs::remove_dir_all(&paths.package_dir)
                .io_context("removing package", &paths.package_dir)?;
            debug!(port = %nv, dir = %paths.package_dir.display(), "purged package");
        }

        if self.options.build_cache {
            remove_build_cache(port)?;
        }

        info!(port = %nv, uninstalled, "removed");
        reporter.removed(nv);
        Ok(())
    }
}

/// Remove `port` from the current context.
pub fn remove(ctx: &Context, port: &Port, options: RemoveOptions) -> Result<()> {
    Remover::new(ctx, options).remove(port)
}

/// Delete the installed files of `port`, its trace record and installed
/// metadata. Returns whether a trace record existed.
pub(crate) fn uninstall(ctx: &Context, port: &Port) -> Result<bool> {
    uninstall_record(ctx, port.name_version(), &port.paths().library_folder)
}

/// Like [`uninstall`], driven by the trace record alone. Works for ports
/// whose definition no longer exists.
pub(crate) fn uninstall_record(ctx: &Context, nv: &NameVersion, library_folder: &str) -> Result<bool> {
    let ws = ctx.workspace();
    let traces = TraceStore::new(ws);
    let installed_root = ws.installed_dir();
    let installed_dir = installed_root.join(library_folder);
    let meta_file = ws.meta_dir().join(format!("{nv}@{library_folder}.meta"));

    let Some(record) = traces.read(nv, library_folder)? else {
        remove_file_if_exists(&meta_file)?;
        return Ok(false);
    };

    for rel in &record.files {
        let path = installed_root.join(rel);
        if std::fs::symlink_metadata(&path).is_ok() {
            std::fs::remove_file(&path).io_context("removing installed file", &path)?;
        }
        prune_empty_parents(&path, &installed_dir);
    }

    traces.remove(nv, library_folder)?;
    remove_file_if_exists(&meta_file)?;
    Ok(true)
}

/// Delete the build dir and build logs of `port`. Returns whether anything
/// was deleted.
pub(crate) fn remove_build_cache(port: &Port) -> Result<bool> {
    let paths = port.paths();
    let mut removed = false;
    if paths.build_dir.exists() {
        std::fs::remove_dir_all(&paths.build_dir).io_context("removing build dir", &paths.build_dir)?;
        removed = true;
    }
    if let Some(pattern) = paths.log_pattern() {
        for log in glob::glob(&pattern)?.flatten() {
            std::fs::remove_file(&log).io_context("removing build log", &log)?;
            removed = true;
        }
    }
    Ok(removed)
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).io_context("removing file", path)?;
    }
    Ok(())
}

/// Delete empty directories from `path`'s parent up to (excluding) `root`.
fn prune_empty_parents(path: &Path, root: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if std::fs::remove_dir(dir).is_err() {
            // Not empty, or already gone.
            break;
        }
        current = dir.parent();
    }
}
