//! Shared types for kiln.
//!
//! Everything here is plain data: port identities, build flags, build hashes
//! and the on-disk models of `port.toml` and project files. Resolution and
//! installation logic lives in `kiln-core`.

/// Content-addressed build hashes.
pub mod hash;
pub mod port;
pub mod project;
/// Core identity types: port names, versions and build flags.
pub mod types;

// Re-exports
pub use hash::*;
pub use port::{BuildConfig, PackageSource, PortManifest};
pub use project::ProjectManifest;
pub use types::*;

/// Errors produced while parsing kiln's on-disk types.
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// A port reference is not of the form `name@version`.
    #[error("invalid port reference '{0}': expected name@version")]
    InvalidNameVersion(String),

    /// Unknown build type spelling.
    #[error("invalid build type '{0}': expected Release, Debug, RelWithDebInfo or MinSizeRel")]
    InvalidBuildType(String),

    /// A build hash is not 64 hex characters.
    #[error("invalid build hash '{0}'")]
    InvalidHash(String),

    /// A TOML document could not be parsed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A TOML document could not be rendered.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Reading a manifest from disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
