//! Package Cache: a shared directory gated by a writable flag.
//!
//! Reads verify that the stored metadata still hashes to the requested key
//! before anything is extracted.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::meta::BuildMeta;

use super::{CacheKey, CacheLookup, CacheStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCache {
    dir: PathBuf,
    writable: bool,
}

impl PackageCache {
    pub fn new(dir: impl Into<PathBuf>, writable: bool) -> Self {
        Self {
            dir: dir.into(),
            writable,
        }
    }

    /// Whether fresh builds may be stored here.
    pub fn writable(&self) -> bool {
        self.writable
    }
}

impl CacheStore for PackageCache {
    fn name(&self) -> &'static str {
        "package cache"
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup> {
        if !self.dir.is_dir() {
            return Ok(CacheLookup::Miss);
        }
        super::read_entry(&self.dir, key, dest, true)
    }

    fn write(&self, package_dir: &Path, meta: &BuildMeta) -> Result<CacheKey> {
        super::write_entry(&self.dir, package_dir, meta)
    }

    fn exist(&self, key: &CacheKey) -> bool {
        super::exist_entry(&self.dir, key)
    }

    fn remove(&self, key: &CacheKey) -> Result<()> {
        super::remove_entry(&self.dir, key)
    }
}
