//! The `port.toml` model.
//!
//! ```toml
//! [package]
//! url = "https://github.com/google/glog.git"
//! ref = "v0.6.0"
//!
//! [[build_configs]]
//! pattern = "*linux*"
//! build_system = "cmake"
//! dependencies = ["gflags@2.2.2"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::{NameVersion, SchemaError};

/// A port definition parsed from `port.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortManifest {
    /// Where the source comes from.
    pub package: PackageSource,

    /// Platform-conditioned build variants. Empty for header-only or virtual
    /// ports that have nothing to build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_configs: Vec<BuildConfig>,
}

/// Source fetch descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSource {
    /// Git repository, archive URL, or local directory (`file://` or plain path).
    pub url: String,

    /// Branch or tag to check out.
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,

    /// Pinned source revision. When set, cache lookups must match it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// Archive file name to store a downloaded source under.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archive: String,

    /// Shallow clone depth, `0` for a full clone.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub depth: u32,

    /// Sub directory of the source tree holding the build files.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src_dir: String,

    /// Host platforms the port can be built on. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_hosts: Vec<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// One platform-conditioned build variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Glob matched against the platform name (`*linux*`, `x86_64*`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    /// Build system identifier (`cmake`, `meson`, `makefiles`, `nobuild`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build_system: String,

    /// Runtime dependencies, linked into the result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<NameVersion>,

    /// Build-time tools, built for the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_dependencies: Vec<NameVersion>,

    /// Options handed to the build system.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Extra environment for the build.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Shell recipe that builds and installs into `$PREFIX`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
}

impl BuildConfig {
    /// Whether this config builds nothing.
    pub fn is_nobuild(&self) -> bool {
        self.build_system == "nobuild"
    }
}

impl PortManifest {
    /// Load a port definition from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid `port.toml`.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a port definition from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] if the text is not valid `port.toml`.
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(content)?)
    }

    /// Render back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Serialize`] if rendering fails.
    pub fn to_toml(&self) -> Result<String, SchemaError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl FromStr for PortManifest {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
