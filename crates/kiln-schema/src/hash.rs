use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::SchemaError;

/// SHA256 digest of a port's build metadata (64 lowercase hex characters).
///
/// Two builds with the same `BuildHash` were produced from the same port
/// configuration, commit and dependency closure, so the hash names cache
/// archives and their metadata files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BuildHash(String);

impl BuildHash {
    /// Hash arbitrary content.
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(Sha256::digest(content.as_ref())))
    }

    /// Create a validated `BuildHash`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidHash`] if `s` is not exactly 64 ASCII hex characters.
    pub fn validated(s: &str) -> Result<Self, SchemaError> {
        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(SchemaError::InvalidHash(s.to_string()))
        }
    }

    /// Whether `content` hashes to this value.
    pub fn matches(&self, content: impl AsRef<[u8]>) -> bool {
        Self::of(content) == *self
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for BuildHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::validated(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for BuildHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BuildHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
