//! kiln - a source-first package manager for C/C++ ports
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Builds ports from source into per-target trees, reusing prebuilt packages
//! from local and shared caches whenever their build metadata matches.
//!
//! # Workspace Layout
//!
//! ```text
//! $KILN_WORKSPACE/
//! ├── kiln.toml       # Global configuration and cache tiers
//! ├── ports/          # <name>/<version>/port.toml
//! ├── conf/projects/  # <project>.toml and per-project port overrides
//! ├── buildtrees/     # Sources, build dirs and build logs
//! ├── packages/       # Built packages, one dir per port and target
//! └── installed/      # Installed trees plus trace records
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kiln")]
#[command(author, version, about = "kiln - a source-first package manager for C/C++ ports")]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install ports (the active project's ports when none are given)
    Install {
        /// Ports as name@version
        ports: Vec<String>,
        /// Reinstall even if already installed, bypassing caches
        #[arg(long, short = 'f')]
        force: bool,
        /// Apply --force to dependencies too
        #[arg(long, short = 'r')]
        recurse: bool,
        /// Store fresh builds in the configured caches
        #[arg(long)]
        store_cache: bool,
        /// Writer token for the binary cache
        #[arg(long, env = "KILN_CACHE_TOKEN", hide_env_values = true)]
        cache_token: Option<String>,
    },
    /// Remove installed ports
    Remove {
        /// Ports as name@version
        #[arg(required = true)]
        ports: Vec<String>,
        /// Also delete the built package
        #[arg(long)]
        purge: bool,
        /// Also remove dependencies
        #[arg(long, short = 'r')]
        recurse: bool,
        /// Also delete build dirs and build logs
        #[arg(long)]
        build_cache: bool,
    },
    /// Delete build dirs and build logs, keeping fetched sources
    Clean {
        /// Ports as name@version (the active project's ports when none are given)
        ports: Vec<String>,
        /// Also clean dependencies
        #[arg(long, short = 'r')]
        recurse: bool,
        /// Clean the host builds of the given ports
        #[arg(long, short = 'd')]
        dev: bool,
        /// Clean every port under buildtrees
        #[arg(long, short = 'a', conflicts_with_all = ["ports", "recurse", "dev"])]
        all: bool,
    },
    /// List the ports that depend on a port
    Reverse {
        /// Port as name@version
        port: String,
        /// Include dev dependencies
        #[arg(long, short = 'd')]
        dev: bool,
    },
    /// Show the dependency tree of a port
    Tree {
        /// Port as name@version
        port: String,
    },
    /// Remove installed ports the active project no longer needs
    Autoremove {
        /// Also delete the built packages
        #[arg(long)]
        purge: bool,
        /// Also delete build dirs and build logs
        #[arg(long)]
        build_cache: bool,
    },
    /// List installed ports
    List,
    /// Update kiln.toml
    Configure {
        /// Target platform name
        #[arg(long)]
        platform: Option<String>,
        /// Active project
        #[arg(long)]
        project: Option<String>,
        /// Release, Debug, RelWithDebInfo or MinSizeRel
        #[arg(long)]
        build_type: Option<String>,
        /// Parallel build jobs
        #[arg(long)]
        jobs: Option<usize>,
        /// Shared package cache dir
        #[arg(long)]
        package_cache_dir: Option<PathBuf>,
        /// Allow storing builds in the package cache
        #[arg(long, requires = "package_cache_dir")]
        package_cache_writable: bool,
        /// Binary cache dir
        #[arg(long)]
        binary_cache_dir: Option<PathBuf>,
        /// Set the binary cache writer token (never replaces an existing one)
        #[arg(long, requires = "binary_cache_dir")]
        cache_token: Option<String>,
        /// Local cache dir
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}
