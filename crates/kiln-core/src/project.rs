//! The active project: which ports it declares.

use kiln_schema::{NameVersion, ProjectManifest};
use tracing::debug;

use crate::error::{KilnError, Result};
use crate::paths::Workspace;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    name: String,
    manifest: ProjectManifest,
}

impl Project {
    /// Load `conf/projects/<name>.toml`. A project without a file declares no ports.
    pub fn load(workspace: &Workspace, name: &str) -> Result<Self> {
        let path = workspace.project_file(name);
        let manifest = if path.exists() {
            ProjectManifest::from_file(&path).map_err(|e| KilnError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            debug!(project = name, "no project file, using an empty project");
            ProjectManifest::default()
        };
        Ok(Self {
            name: name.to_string(),
            manifest,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level ports of the project.
    pub fn ports(&self) -> &[NameVersion] {
        &self.manifest.ports
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }
}
