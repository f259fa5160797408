//! kiln core
//!
//! Dependency validation and the multi-tier install pipeline for C/C++ ports.
//!
//! # Overview
//!
//! A caller resolves the requested ports with [`Port::init`], validates the
//! graph with [`DepCheck`] (cycles, then version conflicts), and installs
//! each port with [`install`]. Dependencies are always installed before
//! their dependents. [`remove`] reverses an install using the trace records
//! written along the way, [`clean`] drops build dirs and logs, and
//! [`reverse_dependencies`] finds the ports that depend on a given one.
//!
//! # Architecture
//!
//! - **Context**: workspace paths, configuration and collaborators resolved
//!   once and passed by reference; there is no global state.
//! - **Collaborators**: [`PortRepository`] supplies port definitions,
//!   [`BuildSystem`] fetches and builds, [`CacheStore`] implementations
//!   store prebuilt packages, [`Reporter`] receives progress.
//! - **Dual namespace**: a port built for the host is a different graph node
//!   ([`NodeKey`]) from the same `name@version` built for the target.

pub mod autoremove;
pub mod builder;
pub mod cache;
pub mod clean;
pub mod config;
pub mod context;
pub mod depcheck;
pub mod error;
pub mod graph;
pub mod install;
pub mod meta;
pub mod paths;
pub mod port;
pub mod project;
pub mod remove;
pub mod report;
pub mod reporter;
pub mod repository;
pub mod reverse;
pub mod trace;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use autoremove::{AutoremoveOptions, InstalledPort, autoremove, installed_ports};
pub use builder::{BuildSystem, ShellBuildSystem};
pub use cache::{BinaryCache, CacheDir, CacheKey, CacheLookup, CacheStore, CacheTiers, PackageCache};
pub use clean::{Cleaner, clean, clean_all, clean_project};
pub use context::Context;
pub use depcheck::{DepCheck, VersionInfo};
pub use error::{KilnError, Result};
pub use graph::{DependencyWalker, EdgeKind, Namespace, NodeKey};
pub use install::{InstallOptions, InstalledFrom, Installer, cache_key, install};
pub use meta::BuildMeta;
pub use paths::Workspace;
pub use port::{MatchedConfig, Port, PortPaths};
pub use project::Project;
pub use remove::{RemoveOptions, Remover, remove};
pub use report::InstallReport;
pub use reporter::{NullReporter, Reporter};
pub use repository::{FsPortRepository, PortRepository};
pub use reverse::{defined_ports, reverse_dependencies};
pub use tree::render_tree;
