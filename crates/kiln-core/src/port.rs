//! Port identity and its resolved build configuration.
//!
//! A [`Port`] is built fresh for every operation: [`Port::init`] asks the
//! port repository for the config matching the current platform, project
//! and build type. Only its effects (packages, installed files, trace
//! records, cache entries) outlive the process.

use std::path::{Path, PathBuf};

use kiln_schema::{BuildConfig, NameVersion, PackageSource, PortFlags, PortName, Version};
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::graph::NodeKey;
use crate::meta::BuildMeta;

/// On-disk locations of one port instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPaths {
    /// `platform@project@build_type` or `<host>-dev`.
    pub library_folder: String,
    /// Sources: `buildtrees/<nv>/src`
    pub repo_dir: PathBuf,
    /// Out-of-source build: `buildtrees/<nv>/<platform>-<project>-<build_type>`
    pub build_dir: PathBuf,
    /// Built artifact: `packages/<nv>@<library folder>`
    pub package_dir: PathBuf,
    /// Shared installed tree: `installed/<library folder>`
    pub installed_dir: PathBuf,
    pub trace_file: PathBuf,
    pub meta_file: PathBuf,
}

impl PortPaths {
    pub fn new(ctx: &Context, nv: &NameVersion, flags: PortFlags) -> Self {
        let ws = ctx.workspace();
        let library_folder = ctx.library_folder(flags);
        let build_folder = if flags.is_host() {
            ctx.host_folder()
        } else {
            format!(
                "{}-{}-{}",
                ctx.platform(),
                ctx.project().name(),
                ctx.build_type().dir_name()
            )
        };
        let buildtree = ws.port_buildtree(nv);
        let record = format!("{nv}@{library_folder}");

        Self {
            repo_dir: buildtree.join("src"),
            build_dir: buildtree.join(build_folder),
            package_dir: ws.packages_dir().join(&record),
            installed_dir: ws.installed_dir().join(&library_folder),
            trace_file: ws.trace_dir().join(format!("{record}.trace")),
            meta_file: ws.meta_dir().join(format!("{record}.meta")),
            library_folder,
        }
    }

    /// Build logs of this instance: `buildtrees/<nv>/<build folder>-*.log`
    pub fn log_pattern(&self) -> Option<String> {
        let folder = self.build_dir.file_name()?.to_str()?;
        let buildtree = self.build_dir.parent()?;
        Some(format!("{}/{folder}-*.log", glob::Pattern::escape(&buildtree.to_string_lossy())))
    }

    pub fn log_file(&self, stage: &str) -> Option<PathBuf> {
        let folder = self.build_dir.file_name()?.to_str()?;
        Some(self.build_dir.parent()?.join(format!("{folder}-{stage}.log")))
    }
}

/// The resolved configuration of one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedConfig {
    pub source: PackageSource,
    pub build: BuildConfig,
    pub paths: PortPaths,
    pub host_name: String,
}

impl MatchedConfig {
    pub fn dependencies(&self) -> &[NameVersion] {
        &self.build.dependencies
    }

    pub fn dev_dependencies(&self) -> &[NameVersion] {
        &self.build.dev_dependencies
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    name_version: NameVersion,
    flags: PortFlags,
    parent: Option<NameVersion>,
    matched: MatchedConfig,
}

impl Port {
    /// Resolve `nv` for the current context. `parent` names the port whose
    /// dependency list led here, for error messages.
    pub fn init(
        ctx: &Context,
        nv: &NameVersion,
        flags: PortFlags,
        parent: Option<&NameVersion>,
    ) -> Result<Self> {
        let matched = ctx.repository().resolve(ctx, nv, flags, parent)?;
        Ok(Self {
            name_version: nv.clone(),
            flags,
            parent: parent.cloned(),
            matched,
        })
    }

    /// Resolve a top-level port for the target platform.
    pub fn target(ctx: &Context, nv: &NameVersion) -> Result<Self> {
        Self::init(ctx, nv, PortFlags::TARGET, None)
    }

    pub fn name_version(&self) -> &NameVersion {
        &self.name_version
    }

    pub fn name(&self) -> &PortName {
        self.name_version.name()
    }

    pub fn version(&self) -> &Version {
        self.name_version.version()
    }

    pub fn flags(&self) -> PortFlags {
        self.flags
    }

    /// Whether the port is built for and installed into the host tree.
    pub fn is_host(&self) -> bool {
        self.flags.is_host()
    }

    pub fn parent(&self) -> Option<&NameVersion> {
        self.parent.as_ref()
    }

    pub fn matched(&self) -> &MatchedConfig {
        &self.matched
    }

    pub fn paths(&self) -> &PortPaths {
        &self.matched.paths
    }

    pub fn source(&self) -> &PackageSource {
        &self.matched.source
    }

    /// Identity in the dependency graph.
    pub fn key(&self) -> NodeKey {
        NodeKey::new(&self.name_version, self.flags)
    }

    pub fn is_nobuild(&self) -> bool {
        self.matched.build.is_nobuild()
    }

    /// Source revision this port builds: the pinned commit, or whatever the
    /// build system reports for the fetched sources.
    pub fn commit(&self, ctx: &Context) -> Result<String> {
        match &self.matched.source.commit {
            Some(commit) if !commit.is_empty() => Ok(commit.clone()),
            _ => ctx.build_system().commit(ctx, self),
        }
    }

    pub fn package_dir(&self) -> &Path {
        &self.matched.paths.package_dir
    }

    pub fn installed_dir(&self) -> &Path {
        &self.matched.paths.installed_dir
    }

    /// Whether a trace record exists for this port and its recorded build
    /// metadata still matches the current configuration.
    pub fn installed(&self, ctx: &Context) -> Result<bool> {
        let paths = self.paths();
        if !paths.trace_file.is_file() {
            return Ok(false);
        }
        let Ok(recorded) = std::fs::read_to_string(&paths.meta_file) else {
            debug!(port = %self.name_version, "trace without metadata, treating as not installed");
            return Ok(false);
        };
        let current = BuildMeta::compute(ctx, self)?;
        if current.as_str() != recorded {
            debug!(port = %self.name_version, "installed build is outdated");
            return Ok(false);
        }
        Ok(true)
    }
}
