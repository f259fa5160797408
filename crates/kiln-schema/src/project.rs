//! Project files (`conf/projects/<name>.toml`).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{BuildType, NameVersion, SchemaError};

/// The ports a project declares, and its preferred build type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Top-level ports of the project.
    #[serde(default)]
    pub ports: Vec<NameVersion>,

    /// Overrides the globally configured build type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildType>,
}

impl ProjectManifest {
    /// Load a project file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a project file from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] if the text is invalid.
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(content)?)
    }
}
