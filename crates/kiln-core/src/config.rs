//! Global configuration (`kiln.toml`).
//!
//! ```toml
//! [global]
//! platform = "x86_64-linux-gnu"
//! project = "demo"
//! build_type = "Release"
//! jobs = 8
//!
//! [binary_cache]
//! dir = "/mnt/kiln/binary"
//!
//! [package_cache]
//! dir = "/mnt/kiln/packages"
//! writable = true
//!
//! [cache_dir]
//! dir = "/mnt/kiln/cache"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kiln_schema::BuildType;

use crate::error::{KilnError, Result};

/// Name of the host platform (`<arch>-<os>`).
pub fn host_name() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Default name of the active project.
pub const DEFAULT_PROJECT: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KilnConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<CacheDirConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_cache: Option<BinaryCacheConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_cache: Option<PackageCacheConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Target platform name. Defaults to the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default)]
    pub build_type: BuildType,

    /// Parallel jobs handed to build systems. Defaults to the CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub verbose: bool,
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            platform: None,
            project: default_project(),
            build_type: BuildType::default(),
            jobs: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirConfig {
    #[serde(default)]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryCacheConfig {
    #[serde(default)]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCacheConfig {
    #[serde(default)]
    pub dir: PathBuf,

    /// Whether fresh builds may be stored.
    #[serde(default)]
    pub writable: bool,
}

impl KilnConfig {
    /// Load `kiln.toml`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| KilnError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| KilnError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Target platform, defaulting to the host.
    pub fn platform(&self) -> String {
        self.global.platform.clone().unwrap_or_else(host_name)
    }

    pub fn jobs(&self) -> usize {
        self.global.jobs.unwrap_or_else(num_cpus::get)
    }
}
