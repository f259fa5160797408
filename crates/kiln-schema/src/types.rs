use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::SchemaError;

/// A port name (e.g. `glog`).
///
/// Port names are the key of version-conflict detection, so they are kept
/// distinct from the full `name@version` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortName(String);

impl PortName {
    /// Create a new `PortName`.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PortName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PortName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PortName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PortName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for PortName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PortName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A port version string (e.g. `0.6.0`).
///
/// Versions are compared as opaque strings: C/C++ libraries do not follow
/// semver consistently, and two spellings of a version are two versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Create a new `Version`.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Return the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The `name@version` identity of a port.
///
/// Serialized as the plain `"name@version"` string used in `port.toml`
/// dependency lists and project files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameVersion {
    name: PortName,
    version: Version,
}

impl NameVersion {
    /// Build a `NameVersion` from its parts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: PortName::new(name),
            version: Version::new(version),
        }
    }

    /// Parse a `name@version` string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidNameVersion`] if the string does not contain
    /// exactly one `@` separating two non-empty parts.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let s = s.trim();
        match s.split_once('@') {
            Some((name, version))
                if !name.is_empty() && !version.is_empty() && !version.contains('@') =>
            {
                Ok(Self::new(name, version))
            }
            _ => Err(SchemaError::InvalidNameVersion(s.to_string())),
        }
    }

    /// The port name.
    pub fn name(&self) -> &PortName {
        &self.name
    }

    /// The port version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for NameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl FromStr for NameVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for NameVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NameVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// CMake-style build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum BuildType {
    /// Optimised build without debug info.
    #[default]
    Release,
    /// Unoptimised build with debug info.
    Debug,
    /// Optimised build with debug info.
    RelWithDebInfo,
    /// Size-optimised build.
    MinSizeRel,
}

impl BuildType {
    /// Canonical spelling, as written in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }

    /// Lowercase spelling, used in directory and cache key names.
    pub fn dir_name(self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "debug" => Ok(Self::Debug),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(SchemaError::InvalidBuildType(s.to_string())),
        }
    }
}

impl Serialize for BuildType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BuildType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Build-context flags carried by every port instance.
///
/// A port that is a dev dependency or is built natively is a "host" port:
/// it is built with the host toolchain and installed into the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortFlags {
    /// Consumed at build time only (e.g. a code generator).
    pub dev_dep: bool,
    /// Built with the host toolchain rather than the target toolchain.
    pub native: bool,
}

impl PortFlags {
    /// Flags of a top-level port requested for the target platform.
    pub const TARGET: Self = Self {
        dev_dep: false,
        native: false,
    };

    /// Flags of a port reached through a dev-dependency edge. Always native.
    pub const DEV: Self = Self {
        dev_dep: true,
        native: true,
    };

    /// Whether the port belongs to the host tree.
    pub fn is_host(self) -> bool {
        self.dev_dep || self.native
    }

    /// Flags for a runtime dependency of a port carrying `self`.
    ///
    /// The child is never a dev dependency itself, but inherits native-ness
    /// from a host parent.
    pub fn for_dependency(self) -> Self {
        Self {
            dev_dep: false,
            native: self.is_host(),
        }
    }

    /// Flags for a dev dependency of any port.
    pub fn for_dev_dependency(self) -> Self {
        Self::DEV
    }
}
