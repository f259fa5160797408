//! Install resolution pipeline.
//!
//! Per port, in order, stopping at the first source that delivers:
//!
//! 1. already installed (skipped with `force`)
//! 2. the local package dir, if its metadata matches
//! 3. binary cache
//! 4. package cache, then cache dir
//! 5. build from source, then store the result when `store_cache` is set
//!
//! Cache tiers are not consulted with `force`. Dependencies are installed
//! before the port itself; `force` reaches them only with `recurse`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{CacheKey, CacheLookup, CacheStore};
use crate::context::Context;
use crate::error::{IoContext, KilnError, Result};
use crate::graph::{DependencyWalker, NodeKey};
use crate::meta::BuildMeta;
use crate::port::Port;
use crate::remove::{RemoveOptions, Remover, uninstall};
use crate::report::InstallReport;
use crate::trace::{TraceRecord, TraceStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Reinstall even if already installed, bypassing cache tiers.
    pub force: bool,
    /// Apply `force` to the whole dependency subtree.
    pub recurse: bool,
    /// Store fresh source builds in the configured cache tiers.
    pub store_cache: bool,
    /// Writer token for the binary cache.
    pub cache_token: Option<String>,
}

/// Where an installed port came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstalledFrom {
    /// Nothing to do.
    Preinstalled,
    /// The local package dir.
    Package,
    BinaryCache,
    PackageCache,
    CacheDir,
    /// Freshly built.
    Source,
}

impl InstalledFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preinstalled => "preinstalled",
            Self::Package => "package",
            Self::BinaryCache => "binary cache",
            Self::PackageCache => "package cache",
            Self::CacheDir => "cache dir",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for InstalledFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TierOutcome {
    Installed,
    Miss,
    /// The tier is not configured or does not apply to this port.
    Unavailable,
}

#[derive(Debug)]
pub struct Installer<'a> {
    ctx: &'a Context,
    options: InstallOptions,
    remover: Remover<'a>,
    done: HashMap<NodeKey, InstalledFrom>,
    visiting: Vec<NodeKey>,
    report: InstallReport,
}

impl<'a> Installer<'a> {
    pub fn new(ctx: &'a Context, options: InstallOptions) -> Self {
        let remover = Remover::new(
            ctx,
            RemoveOptions {
                purge: true,
                recurse: options.recurse,
                build_cache: true,
            },
        );
        Self {
            ctx,
            options,
            remover,
            done: HashMap::new(),
            visiting: Vec::new(),
            report: InstallReport::new(ctx),
        }
    }

    /// Install `port` and everything it depends on.
    pub fn install(&mut self, port: &Port) -> Result<InstalledFrom> {
        self.validate_store_cache()?;
        let force = self.options.force;
        self.install_port(port, force)
    }

    /// Ports touched so far and where they came from.
    pub fn report(&self) -> &InstallReport {
        &self.report
    }

    pub fn into_report(self) -> InstallReport {
        self.report
    }

    /// Storing builds was requested: fail now rather than after a long build.
    fn validate_store_cache(&self) -> Result<()> {
        if !self.options.store_cache {
            return Ok(());
        }
        let caches = self.ctx.caches();
        if caches.is_empty() {
            return Err(KilnError::BinaryCacheDirNotConfigured);
        }
        if let Some(binary) = &caches.binary_cache {
            binary.authorize(self.options.cache_token.as_deref())?;
        }
        Ok(())
    }

    fn install_port(&mut self, port: &Port, force: bool) -> Result<InstalledFrom> {
        let key = port.key();
        if let Some(from) = self.done.get(&key) {
            return Ok(*from);
        }
        if self.visiting.contains(&key) {
            let chain = self
                .visiting
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(KilnError::CircularDependency(chain));
        }

        let ctx = self.ctx;
        let nv = port.name_version();

        if !force && port.installed(ctx)? {
            debug!(port = %nv, "already installed");
            return Ok(self.finish(port, InstalledFrom::Preinstalled));
        }

        if force {
            self.remover.remove(port)?;
        } else if port.paths().trace_file.exists() {
            // Installed from an outdated configuration.
            uninstall(ctx, port)?;
        }

        ctx.reporter().installing(nv, port.is_host());
        self.visiting.push(key);
        let result = self.resolve(port, force);
        self.visiting.pop();

        match result {
            Ok(from) => {
                info!(port = %nv, from = %from, "installed");
                Ok(self.finish(port, from))
            }
            Err(e) => {
                ctx.reporter().failed(nv, &e.to_string());
                Err(e)
            }
        }
    }

    fn finish(&mut self, port: &Port, from: InstalledFrom) -> InstalledFrom {
        self.done.insert(port.key(), from);
        self.report.record(port, from);
        self.ctx.reporter().installed(port.name_version(), from);
        from
    }

    fn resolve(&mut self, port: &Port, force: bool) -> Result<InstalledFrom> {
        self.install_dependencies(port, force)?;

        let meta = BuildMeta::compute(self.ctx, port)?;

        if self.from_package(port, &meta)? == TierOutcome::Installed {
            return Ok(InstalledFrom::Package);
        }

        if !force {
            let caches = self.ctx.caches();
            if let Some(binary) = &caches.binary_cache {
                if self.from_cache(binary, port, &meta)? == TierOutcome::Installed {
                    return Ok(InstalledFrom::BinaryCache);
                }
            }
            if let Some(package_cache) = &caches.package_cache {
                if self.from_cache(package_cache, port, &meta)? == TierOutcome::Installed {
                    return Ok(InstalledFrom::PackageCache);
                }
            }
            if let Some(cache_dir) = &caches.cache_dir {
                if self.from_cache(cache_dir, port, &meta)? == TierOutcome::Installed {
                    return Ok(InstalledFrom::CacheDir);
                }
            }
        }

        self.from_source(port, &meta)?;
        Ok(InstalledFrom::Source)
    }

    fn install_dependencies(&mut self, port: &Port, force: bool) -> Result<()> {
        let force_children = force && self.options.recurse;
        for (_, child) in DependencyWalker::new(self.ctx).children(port)? {
            if self.done.contains_key(&child.key()) {
                continue;
            }
            if force_children || !child.installed(self.ctx)? {
                self.install_port(&child, force_children)?;
            } else {
                self.finish(&child, InstalledFrom::Preinstalled);
            }
        }
        Ok(())
    }

    fn from_package(&self, port: &Port, meta: &BuildMeta) -> Result<TierOutcome> {
        let package_dir = port.package_dir();
        if !package_dir.is_dir() {
            return Ok(TierOutcome::Miss);
        }

        let meta_path = package_meta_path(package_dir, meta);
        let current = std::fs::read_to_string(&meta_path).is_ok_and(|m| m == meta.as_str());
        if !current {
            warn!(port = %port.name_version(), "package is outdated, rebuilding");
            self.ctx
                .reporter()
                .warning(&format!("{} package is outdated, rebuilding", port.name_version()));
            std::fs::remove_dir_all(package_dir).io_context("removing outdated package", package_dir)?;
            return Ok(TierOutcome::Miss);
        }

        install_package(self.ctx, port, meta)?;
        Ok(TierOutcome::Installed)
    }

    fn from_cache(&self, store: &dyn CacheStore, port: &Port, meta: &BuildMeta) -> Result<TierOutcome> {
        if port.is_host() {
            return Ok(TierOutcome::Unavailable);
        }
        let key = cache_key(self.ctx, port, meta);
        match store.read(&key, port.package_dir())? {
            CacheLookup::Miss => Ok(TierOutcome::Miss),
            CacheLookup::Found => {
                debug!(port = %port.name_version(), tier = store.name(), dir = %store.dir().display(), "restored from cache");
                std::fs::write(package_meta_path(port.package_dir(), meta), meta.as_str())?;
                install_package(self.ctx, port, meta)?;
                Ok(TierOutcome::Installed)
            }
        }
    }

    fn from_source(&self, port: &Port, meta: &BuildMeta) -> Result<()> {
        let ctx = self.ctx;
        let build_system = ctx.build_system();
        build_system.fetch(ctx, port)?;
        build_system.build(ctx, port)?;

        let package_dir = port.package_dir();
        if !package_dir.is_dir() {
            return Err(KilnError::build(
                port.name_version(),
                format!("build produced no package at {}", package_dir.display()),
            ));
        }
        std::fs::write(package_meta_path(package_dir, meta), meta.as_str())?;
        install_package(ctx, port, meta)?;

        if self.options.store_cache {
            self.store(port, meta)?;
        }
        Ok(())
    }

    /// Write a fresh build to every configured tier that accepts it.
    fn store(&self, port: &Port, meta: &BuildMeta) -> Result<()> {
        let nv = port.name_version();
        if port.is_host() {
            debug!(port = %nv, "host ports are not cached");
            return Ok(());
        }

        let caches = self.ctx.caches();
        let package_dir = port.package_dir();
        if let Some(binary) = &caches.binary_cache {
            binary.authorize(self.options.cache_token.as_deref())?;
            binary.write(package_dir, meta)?;
            info!(port = %nv, dir = %binary.dir().display(), "stored in binary cache");
        }
        if let Some(package_cache) = &caches.package_cache {
            if package_cache.writable() {
                package_cache.write(package_dir, meta)?;
                info!(port = %nv, dir = %package_cache.dir().display(), "stored in package cache");
            } else {
                warn!(port = %nv, "package cache is read-only, not storing");
            }
        }
        if let Some(cache_dir) = &caches.cache_dir {
            cache_dir.write(package_dir, meta)?;
            info!(port = %nv, dir = %cache_dir.dir().display(), "stored in cache dir");
        }
        Ok(())
    }
}

/// Install `port` (and its dependencies) with `options`, then write the
/// install report.
pub fn install(ctx: &Context, port: &Port, options: InstallOptions) -> Result<InstalledFrom> {
    let mut installer = Installer::new(ctx, options);
    let from = installer.install(port)?;
    let report = installer.into_report();
    let path = report.write(ctx.workspace(), port.name_version())?;
    debug!(report = %path.display(), "wrote install report");
    Ok(from)
}

/// Cache key of `port` in the current context.
pub fn cache_key(ctx: &Context, port: &Port, meta: &BuildMeta) -> CacheKey {
    CacheKey {
        name_version: port.name_version().clone(),
        platform: ctx.platform().to_string(),
        project: ctx.project().name().to_string(),
        build_type: ctx.build_type(),
        commit: port.source().commit.clone().filter(|c| !c.is_empty()),
        hash: meta.hash(),
    }
}

fn package_meta_path(package_dir: &Path, meta: &BuildMeta) -> PathBuf {
    package_dir.join(format!("{}.meta", meta.hash()))
}

/// Copy the package of `port` into its installed tree and record it.
fn install_package(ctx: &Context, port: &Port, meta: &BuildMeta) -> Result<()> {
    let paths = port.paths();
    let package_dir = &paths.package_dir;
    let installed_dir = &paths.installed_dir;
    std::fs::create_dir_all(installed_dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(package_dir).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(package_dir)
            .map_err(|e| KilnError::context("walking package", e))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        // Package metadata stays with the package.
        if entry.depth() == 1 && rel.extension().is_some_and(|ext| ext == "meta") {
            continue;
        }

        let dest = installed_dir.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if std::fs::symlink_metadata(&dest).is_ok() {
            std::fs::remove_file(&dest)?;
        }
        if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest).io_context("installing file", &dest)?;
        }
        files.push(Path::new(&paths.library_folder).join(rel));
    }

    TraceStore::new(ctx.workspace()).write(&TraceRecord {
        name_version: port.name_version().clone(),
        library_folder: paths.library_folder.clone(),
        files,
    })?;

    if let Some(parent) = paths.meta_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&paths.meta_file, meta.as_str()).io_context("writing installed metadata", &paths.meta_file)?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = std::fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dest).io_context("installing symlink", dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    std::fs::copy(src, dest).io_context("installing file", dest)?;
    Ok(())
}
