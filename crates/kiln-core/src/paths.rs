//! Workspace layout.
//!
//! ```text
//! <workspace>/
//! ├── kiln.toml
//! ├── ports/<name>/<version>/port.toml
//! ├── conf/projects/<project>.toml
//! ├── conf/projects/<project>/<name>/<version>/port.toml   # overrides
//! ├── buildtrees/<name@version>/{src,<library folder>,*.log}
//! ├── packages/<name@version>@<library folder>/
//! ├── installed/<library folder>/
//! ├── installed/kiln/{trace,meta,reports}/
//! └── tmp/
//! ```

use std::path::{Path, PathBuf};

use kiln_schema::NameVersion;

/// Environment variable overriding the workspace root.
pub const WORKSPACE_ENV: &str = "KILN_WORKSPACE";

/// Returns the workspace root: `KILN_WORKSPACE`, or the current directory.
pub fn try_workspace_root() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(WORKSPACE_ENV) {
        return Some(PathBuf::from(val));
    }
    std::env::current_dir().ok()
}

/// All directories derived from a workspace root, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Global configuration: `<root>/kiln.toml`
    pub fn config_file(&self) -> PathBuf {
        self.root.join("kiln.toml")
    }

    pub fn ports_dir(&self) -> PathBuf {
        self.root.join("ports")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("conf").join("projects")
    }

    /// Project file: `conf/projects/<project>.toml`
    pub fn project_file(&self, project: &str) -> PathBuf {
        self.projects_dir().join(format!("{project}.toml"))
    }

    /// Default port definition: `ports/<name>/<version>/port.toml`
    pub fn port_file(&self, nv: &NameVersion) -> PathBuf {
        self.ports_dir()
            .join(nv.name().as_str())
            .join(nv.version().as_str())
            .join("port.toml")
    }

    /// Project-specific port override: `conf/projects/<project>/<name>/<version>/port.toml`
    pub fn project_port_file(&self, project: &str, nv: &NameVersion) -> PathBuf {
        self.projects_dir()
            .join(project)
            .join(nv.name().as_str())
            .join(nv.version().as_str())
            .join("port.toml")
    }

    pub fn buildtrees_dir(&self) -> PathBuf {
        self.root.join("buildtrees")
    }

    /// Build logs and trees of one port: `buildtrees/<name@version>`
    pub fn port_buildtree(&self, nv: &NameVersion) -> PathBuf {
        self.buildtrees_dir().join(nv.to_string())
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn installed_dir(&self) -> PathBuf {
        self.root.join("installed")
    }

    /// Bookkeeping of the installed trees: `installed/kiln`
    pub fn state_dir(&self) -> PathBuf {
        self.installed_dir().join("kiln")
    }

    pub fn trace_dir(&self) -> PathBuf {
        self.state_dir().join("trace")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.state_dir().join("meta")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.state_dir().join("reports")
    }

    /// Temp path (guaranteed same volume as the installed trees)
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Generate a report path for a top-level install
    pub fn report_path(&self, nv: &NameVersion) -> PathBuf {
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        self.reports_dir().join(format!("{nv}-{timestamp}.json"))
    }
}
