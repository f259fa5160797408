//! Cache tiers.
//!
//! Three stores share one layout and one contract:
//!
//! ```text
//! <dir>/<platform>/<project>/<build_type>/<name@version>/
//! ├── <hash>.tar.zst
//! └── meta/<hash>.meta
//! ```
//!
//! `hash` is the [`BuildHash`] of the package's build metadata, so an entry
//! can only be found by a port resolving to the exact same configuration,
//! commit and dependency closure.

pub mod archive;
pub mod binary;
pub mod dir;
pub mod package;

pub use binary::BinaryCache;
pub use dir::CacheDir;
pub use package::PackageCache;

use std::path::{Path, PathBuf};

use kiln_schema::{BuildHash, BuildType, NameVersion};
use tracing::debug;

use crate::config::KilnConfig;
use crate::error::{IoContext, KilnError, Result};
use crate::meta::BuildMeta;

/// Identity of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name_version: NameVersion,
    pub platform: String,
    pub project: String,
    pub build_type: BuildType,
    /// Pinned source revision. A lookup for a pinned port fails with
    /// `CacheNotFoundWithCommit` when the store holds builds of the port but
    /// none of them from this revision.
    pub commit: Option<String>,
    pub hash: BuildHash,
}

impl CacheKey {
    /// Derive the key of a package directory named
    /// `name@version@platform@project@build_type`.
    pub fn from_package_dir(package_dir: &Path, hash: BuildHash) -> Result<Self> {
        let invalid = || KilnError::InvalidPackageDir(package_dir.to_path_buf());
        let file_name = package_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = file_name.split('@').collect();
        let [name, version, platform, project, build_type] = parts.as_slice() else {
            return Err(invalid());
        };
        if [name, version, platform, project].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            name_version: NameVersion::new(*name, *version),
            platform: (*platform).to_string(),
            project: (*project).to_string(),
            build_type: build_type.parse().map_err(|_| invalid())?,
            commit: None,
            hash,
        })
    }

    /// Directory holding every build of this port for the key's target.
    pub fn entry_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.platform)
            .join(&self.project)
            .join(self.build_type.dir_name())
            .join(self.name_version.to_string())
    }

    pub fn archive_path(&self, root: &Path) -> PathBuf {
        self.entry_dir(root).join(format!("{}.tar.zst", self.hash))
    }

    pub fn meta_path(&self, root: &Path) -> PathBuf {
        self.entry_dir(root)
            .join("meta")
            .join(format!("{}.meta", self.hash))
    }
}

/// Result of a successful cache query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    /// The entry was materialized into the destination.
    Found,
    /// No entry; fall through to the next source.
    Miss,
}

/// A store of prebuilt packages.
pub trait CacheStore {
    /// Human-readable tier name for reports.
    fn name(&self) -> &'static str;

    fn dir(&self) -> &Path;

    /// Materialize the entry for `key` into `dest` (a package directory).
    fn read(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup>;

    /// Store the package in `package_dir`, described by `meta`.
    fn write(&self, package_dir: &Path, meta: &BuildMeta) -> Result<CacheKey>;

    fn exist(&self, key: &CacheKey) -> bool;

    fn remove(&self, key: &CacheKey) -> Result<()>;
}

/// The configured tiers, in lookup order.
#[derive(Debug, Clone, Default)]
pub struct CacheTiers {
    pub binary_cache: Option<BinaryCache>,
    pub package_cache: Option<PackageCache>,
    pub cache_dir: Option<CacheDir>,
}

impl CacheTiers {
    /// Build tiers from `kiln.toml`.
    ///
    /// A `[binary_cache]` section is kept even without a dir so the install
    /// pipeline can report it as misconfigured. The other tiers are skipped
    /// when no dir is set.
    pub fn from_config(config: &KilnConfig) -> Self {
        Self {
            binary_cache: config
                .binary_cache
                .as_ref()
                .map(|c| BinaryCache::new(&c.dir)),
            package_cache: config
                .package_cache
                .as_ref()
                .filter(|c| !c.dir.as_os_str().is_empty())
                .map(|c| PackageCache::new(&c.dir, c.writable)),
            cache_dir: config
                .cache_dir
                .as_ref()
                .filter(|c| !c.dir.as_os_str().is_empty())
                .map(|c| CacheDir::new(&c.dir)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.binary_cache.is_none() && self.package_cache.is_none() && self.cache_dir.is_none()
    }
}

/// Shared lookup: extract the entry into `dest` through a sibling temp dir.
pub(crate) fn read_entry(root: &Path, key: &CacheKey, dest: &Path, verify: bool) -> Result<CacheLookup> {
    let archive_path = key.archive_path(root);
    let meta_path = key.meta_path(root);

    if archive_path.is_file() && meta_path.is_file() {
        if verify {
            let meta = std::fs::read_to_string(&meta_path).io_context("reading cache meta", &meta_path)?;
            if !key.hash.matches(&meta) {
                return Err(KilnError::CacheCorrupted(key.name_version.clone()));
            }
        }

        let parent = dest
            .parent()
            .ok_or_else(|| KilnError::InvalidPackageDir(dest.to_path_buf()))?;
        std::fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(".kiln-extract-")
            .tempdir_in(parent)?;
        archive::unpack(&archive_path, staging.path())?;

        if dest.exists() {
            std::fs::remove_dir_all(dest)?;
        }
        std::fs::rename(staging.keep(), dest).io_context("moving extracted package", dest)?;
        debug!(port = %key.name_version, archive = %archive_path.display(), "cache hit");
        return Ok(CacheLookup::Found);
    }

    if let Some(commit) = &key.commit {
        let commits = stored_commits(root, key)?;
        if !commits.is_empty() && !commits.iter().any(|c| c == commit) {
            return Err(KilnError::CacheNotFoundWithCommit {
                port: key.name_version.clone(),
                commit: commit.clone(),
            });
        }
    }

    debug!(port = %key.name_version, dir = %root.display(), "cache miss");
    Ok(CacheLookup::Miss)
}

/// Commits recorded by every stored build of the key's port.
fn stored_commits(root: &Path, key: &CacheKey) -> Result<Vec<String>> {
    let meta_dir = key.entry_dir(root).join("meta");
    let Ok(entries) = std::fs::read_dir(&meta_dir) else {
        return Ok(Vec::new());
    };

    let mut commits = Vec::new();
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "meta") {
            continue;
        }
        let content = std::fs::read_to_string(&path).io_context("reading cache meta", &path)?;
        if let Some(commit) = BuildMeta::from_string(content).commit() {
            commits.push(commit.to_string());
        }
    }
    Ok(commits)
}

/// Shared store: archive first (temp file + rename), then its metadata.
pub(crate) fn write_entry(root: &Path, package_dir: &Path, meta: &BuildMeta) -> Result<CacheKey> {
    if !package_dir.is_dir() {
        return Err(KilnError::InvalidPackageDir(package_dir.to_path_buf()));
    }
    let key = CacheKey::from_package_dir(package_dir, meta.hash())?;
    let entry_dir = key.entry_dir(root);
    std::fs::create_dir_all(entry_dir.join("meta")).io_context("creating cache entry", &entry_dir)?;

    let staging = tempfile::Builder::new()
        .prefix(".kiln-")
        .suffix(".tar.zst")
        .tempfile_in(&entry_dir)?;
    archive::pack(package_dir, staging.path())?;
    let archive_path = key.archive_path(root);
    staging
        .persist(&archive_path)
        .map_err(|e| KilnError::from(e.error))?;

    std::fs::write(key.meta_path(root), meta.as_str())?;
    debug!(port = %key.name_version, archive = %archive_path.display(), "cache stored");
    Ok(key)
}

pub(crate) fn exist_entry(root: &Path, key: &CacheKey) -> bool {
    key.archive_path(root).is_file() && key.meta_path(root).is_file()
}

pub(crate) fn remove_entry(root: &Path, key: &CacheKey) -> Result<()> {
    for path in [key.archive_path(root), key.meta_path(root)] {
        if path.exists() {
            std::fs::remove_file(&path).io_context("removing cache entry", &path)?;
        }
    }

    // Drop directories left empty.
    let entry_dir = key.entry_dir(root);
    for dir in [entry_dir.join("meta"), entry_dir] {
        if std::fs::read_dir(&dir).is_ok_and(|mut d| d.next().is_none()) {
            std::fs::remove_dir(&dir)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_package_dir() {
        let hash = BuildHash::of("meta");
        let key = CacheKey::from_package_dir(
            Path::new("/ws/packages/glog@0.6.0@x86_64-linux@demo@release"),
            hash.clone(),
        )
        .unwrap();
        assert_eq!(key.name_version.to_string(), "glog@0.6.0");
        assert_eq!(key.platform, "x86_64-linux");
        assert_eq!(key.project, "demo");
        assert_eq!(key.build_type, BuildType::Release);
        assert_eq!(
            key.archive_path(Path::new("/cache")),
            PathBuf::from(format!(
                "/cache/x86_64-linux/demo/release/glog@0.6.0/{hash}.tar.zst"
            ))
        );
    }

    #[test]
    fn test_key_rejects_host_package_dir() {
        let err = CacheKey::from_package_dir(
            Path::new("/ws/packages/cmake@3.30.5@x86_64-linux-dev"),
            BuildHash::of("meta"),
        )
        .unwrap_err();
        assert!(matches!(err, KilnError::InvalidPackageDir(_)));
    }

    #[test]
    fn test_from_config_skips_empty_dirs() {
        let config: KilnConfig = toml::from_str(
            r#"
[binary_cache]
[cache_dir]
dir = ""
[package_cache]
dir = "/mnt/pkgs"
"#,
        )
        .unwrap();
        let tiers = CacheTiers::from_config(&config);
        assert!(tiers.binary_cache.is_some());
        assert!(tiers.cache_dir.is_none());
        assert!(!tiers.package_cache.unwrap().writable());
    }
}
