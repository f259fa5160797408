//! Error values of the core.
//!
//! Every failure the install and removal pipelines can surface has its own
//! variant so callers can render a precise message.

use kiln_schema::{NameVersion, SchemaError};
use std::path::PathBuf;
use thiserror::Error;

/// Core result alias.
pub type Result<T, E = KilnError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum KilnError {
    /// A runtime dependency cycle, rendered as `a -> b -> a`.
    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    /// A dev-dependency cycle, rendered as `a@dev -> b@dev -> a@dev`.
    #[error("circular dev_dependency detected: {0}")]
    CircularDevDependency(String),

    /// One or more port names resolve to several versions.
    #[error("conflicting versions of ports detected:\n{0}")]
    VersionConflict(String),

    #[error("port {0} is not defined")]
    PortNotFound(NameVersion),

    #[error("{port} specified in {parent} is not defined")]
    PortNotFoundIn {
        port: NameVersion,
        parent: NameVersion,
    },

    #[error("no matched build config found for {port} on {target}")]
    NoMatchedConfigFound { port: NameVersion, target: String },

    #[error("{port} is not supported on host {host}")]
    UnsupportedHost { port: NameVersion, host: String },

    #[error("binary cache dir is not configured")]
    BinaryCacheDirNotConfigured,

    #[error("binary cache token is not configured, set one with `kiln configure --cache-token`")]
    BinaryCacheTokenNotConfigured,

    #[error("binary cache token is not specified, pass it with `--cache-token`")]
    BinaryCacheTokenNotSpecified,

    #[error("binary cache token does not match")]
    BinaryCacheTokenNotMatch,

    #[error("no cache entry of {port} found for commit {commit}")]
    CacheNotFoundWithCommit { port: NameVersion, commit: String },

    #[error("cached metadata of {0} does not match its build hash")]
    CacheCorrupted(NameVersion),

    #[error("invalid package dir {}: expected name@version@platform@project@build_type", .0.display())]
    InvalidPackageDir(PathBuf),

    #[error("invalid package {}: build metadata is missing", .0.display())]
    InvalidPackage(PathBuf),

    #[error("failed to build {port}: {message}")]
    Build { port: NameVersion, message: String },

    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl KilnError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    pub(crate) fn build(port: &NameVersion, msg: impl std::fmt::Display) -> Self {
        Self::Build {
            port: port.clone(),
            message: msg.to_string(),
        }
    }

    /// Whether the error is one of the graph validation failures.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency(_) | Self::CircularDevDependency(_) | Self::VersionConflict(_)
        )
    }
}

impl From<walkdir::Error> for KilnError {
    fn from(err: walkdir::Error) -> Self {
        Self::context("walking directory", err)
    }
}

impl From<glob::PatternError> for KilnError {
    fn from(err: glob::PatternError) -> Self {
        Self::context("invalid glob pattern", err)
    }
}

impl From<serde_json::Error> for KilnError {
    fn from(err: serde_json::Error) -> Self {
        Self::context("encoding install report", err)
    }
}

/// Attach context to IO failures.
pub(crate) trait IoContext<T> {
    fn io_context(self, what: &'static str, path: &std::path::Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, what: &'static str, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| KilnError::context(what, format!("{}: {e}", path.display())))
    }
}
