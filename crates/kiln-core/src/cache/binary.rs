//! Binary Cache: a shared store whose writers must present a token.
//!
//! The expected token is kept as a sha256 digest in `<dir>/token`. Anyone
//! may read; storing requires [`BinaryCache::authorize`] to pass first.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{KilnError, Result};
use crate::meta::BuildMeta;

use super::{CacheKey, CacheLookup, CacheStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCache {
    dir: PathBuf,
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

impl BinaryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_file(&self) -> PathBuf {
        self.dir.join("token")
    }

    /// Fails unless the cache dir is set and exists.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() || !self.dir.is_dir() {
            return Err(KilnError::BinaryCacheDirNotConfigured);
        }
        Ok(())
    }

    /// Install the writer token. An existing token is never replaced.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.ensure_configured()?;
        if token.trim().is_empty() {
            return Err(KilnError::BinaryCacheTokenNotSpecified);
        }
        let path = self.token_file();
        if path.exists() {
            return Err(KilnError::context(
                "binary cache token",
                format!("{} already exists", path.display()),
            ));
        }
        std::fs::write(&path, digest(token))?;
        Ok(())
    }

    /// Check a writer's token against the stored digest.
    pub fn authorize(&self, token: Option<&str>) -> Result<()> {
        self.ensure_configured()?;
        let path = self.token_file();
        let expected = match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => return Err(KilnError::BinaryCacheTokenNotConfigured),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KilnError::BinaryCacheTokenNotConfigured);
            }
            Err(e) => return Err(e.into()),
        };
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(KilnError::BinaryCacheTokenNotSpecified)?;
        if digest(token) != expected.trim() {
            return Err(KilnError::BinaryCacheTokenNotMatch);
        }
        Ok(())
    }
}

impl CacheStore for BinaryCache {
    fn name(&self) -> &'static str {
        "binary cache"
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup> {
        self.ensure_configured()?;
        super::read_entry(&self.dir, key, dest, true)
    }

    fn write(&self, package_dir: &Path, meta: &BuildMeta) -> Result<CacheKey> {
        self.ensure_configured()?;
        super::write_entry(&self.dir, package_dir, meta)
    }

    fn exist(&self, key: &CacheKey) -> bool {
        super::exist_entry(&self.dir, key)
    }

    fn remove(&self, key: &CacheKey) -> Result<()> {
        super::remove_entry(&self.dir, key)
    }
}
