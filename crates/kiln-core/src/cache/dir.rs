//! Cache Dir: a local or network-mounted directory, plain file operations.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::meta::BuildMeta;

use super::{CacheKey, CacheLookup, CacheStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDir {
    dir: PathBuf,
}

impl CacheDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CacheStore for CacheDir {
    fn name(&self) -> &'static str {
        "cache dir"
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup> {
        if !self.dir.is_dir() {
            return Ok(CacheLookup::Miss);
        }
        super::read_entry(&self.dir, key, dest, false)
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
