//! Everything an operation needs, resolved once and passed by reference.

use std::fmt;
use std::sync::Arc;

use kiln_schema::{BuildType, PortFlags};

use crate::builder::{BuildSystem, ShellBuildSystem};
use crate::cache::CacheTiers;
use crate::config::{KilnConfig, host_name};
use crate::error::Result;
use crate::paths::Workspace;
use crate::project::Project;
use crate::reporter::{NullReporter, Reporter};
use crate::repository::{FsPortRepository, PortRepository};

pub struct Context {
    workspace: Workspace,
    config: KilnConfig,
    platform: String,
    host_name: String,
    project: Project,
    build_type: BuildType,
    jobs: usize,
    caches: CacheTiers,
    repository: Arc<dyn PortRepository>,
    build_system: Arc<dyn BuildSystem>,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("workspace", &self.workspace)
            .field("platform", &self.platform)
            .field("project", &self.project.name())
            .field("build_type", &self.build_type)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Load `kiln.toml` and the active project of `workspace`.
    pub fn load(workspace: Workspace) -> Result<Self> {
        let config = KilnConfig::load(&workspace.config_file())?;
        Self::with_config(workspace, config)
    }

    pub fn with_config(workspace: Workspace, config: KilnConfig) -> Result<Self> {
        let project = Project::load(&workspace, &config.global.project)?;
        let build_type = project
            .manifest()
            .build_type
            .unwrap_or(config.global.build_type);

        Ok(Self {
            platform: config.platform(),
            host_name: host_name(),
            jobs: config.jobs(),
            caches: CacheTiers::from_config(&config),
            repository: Arc::new(FsPortRepository),
            build_system: Arc::new(ShellBuildSystem),
            reporter: Arc::new(NullReporter),
            workspace,
            config,
            project,
            build_type,
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_build_system(mut self, build_system: Arc<dyn BuildSystem>) -> Self {
        self.build_system = build_system;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn PortRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    /// Target platform name.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn caches(&self) -> &CacheTiers {
        &self.caches
    }

    pub fn repository(&self) -> &dyn PortRepository {
        self.repository.as_ref()
    }

    pub fn build_system(&self) -> &dyn BuildSystem {
        self.build_system.as_ref()
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Installed-tree folder of ports carrying `flags`:
    /// `platform@project@build_type`, or `<host>-dev` for host ports.
    pub fn library_folder(&self, flags: PortFlags) -> String {
        if flags.is_host() {
            self.host_folder()
        } else {
            format!(
                "{}@{}@{}",
                self.platform,
                self.project.name(),
                self.build_type.dir_name()
            )
        }
    }

    /// Installed-tree folder of the host toolchain.
    pub fn host_folder(&self) -> String {
        format!("{}-dev", self.host_name)
    }

    /// Name build-config patterns are matched against.
    pub fn match_target(&self, flags: PortFlags) -> String {
        if flags.is_host() {
            self.host_folder()
        } else {
            self.platform.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folders() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = KilnConfig::default();
        config.global.platform = Some("aarch64-linux-gnu".into());
        config.global.project = "demo".into();
        config.global.build_type = BuildType::Debug;
        let ctx = Context::with_config(Workspace::new(tmp.path()), config).unwrap();

        assert_eq!(
            ctx.library_folder(PortFlags::TARGET),
            "aarch64-linux-gnu@demo@debug"
        );
        assert_eq!(
            ctx.library_folder(PortFlags::DEV),
            format!("{}-dev", host_name())
        );
        assert_eq!(ctx.match_target(PortFlags::TARGET), "aarch64-linux-gnu");
    }

    #[test]
    fn test_project_build_type_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path());
        std::fs::create_dir_all(ws.projects_dir()).unwrap();
        std::fs::write(
            ws.project_file("demo"),
            "ports = [\"zlib@1.3.1\"]\nbuild_type = \"RelWithDebInfo\"\n",
        )
        .unwrap();
        std::fs::write(
            ws.config_file(),
            "[global]\nproject = \"demo\"\nbuild_type = \"Debug\"\n",
        )
        .unwrap();

        let ctx = Context::load(ws).unwrap();
        assert_eq!(ctx.build_type(), BuildType::RelWithDebInfo);
        assert_eq!(ctx.project().ports().len(), 1);
    }
}
