use std::path::Path;
use std::sync::Arc;

use kiln_schema::NameVersion;
use tempfile::TempDir;

use crate::builder::BuildSystem;
use crate::config::KilnConfig;
use crate::context::Context;
use crate::error::Result;
use crate::paths::Workspace;
use crate::port::Port;

/// Builds nothing; every port reports the same commit.
#[derive(Debug, Default)]
pub(crate) struct StubBuildSystem;

impl BuildSystem for StubBuildSystem {
    fn fetch(&self, _: &Context, _: &Port) -> Result<()> {
        Ok(())
    }

    fn commit(&self, _: &Context, _: &Port) -> Result<String> {
        Ok("stub".to_string())
    }

    fn build(&self, _: &Context, port: &Port) -> Result<()> {
        std::fs::create_dir_all(port.package_dir().join("include"))?;
        std::fs::write(
            port.package_dir()
                .join("include")
                .join(format!("{}.h", port.name())),
            "",
        )?;
        Ok(())
    }
}

/// A throwaway workspace with port definitions.
pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn write_port(&self, nv: &str, content: &str) {
        let nv = NameVersion::parse(nv).unwrap();
        let path = Workspace::new(self.root()).port_file(&nv);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn list(items: &[&str]) -> String {
        items
            .iter()
            .map(|s| format!("\"{s}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn port(&self, nv: &str, deps: &[&str], dev_deps: &[&str]) {
        self.write_port(
            nv,
            &format!(
                "[package]\nurl = \"_\"\n\n[[build_configs]]\nbuild_system = \"cmake\"\ndependencies = [{}]\ndev_dependencies = [{}]\n",
                Self::list(deps),
                Self::list(dev_deps)
            ),
        );
    }

    pub(crate) fn port_with_options(&self, nv: &str, options: &[&str]) {
        self.write_port(
            nv,
            &format!(
                "[package]\nurl = \"_\"\n\n[[build_configs]]\nbuild_system = \"cmake\"\noptions = [{}]\n",
                Self::list(options)
            ),
        );
    }

    pub(crate) fn port_pinned(&self, nv: &str, commit: &str) {
        self.write_port(
            nv,
            &format!("[package]\nurl = \"_\"\ncommit = \"{commit}\"\n\n[[build_configs]]\nbuild_system = \"cmake\"\n"),
        );
    }

    pub(crate) fn context(&self) -> Context {
        let mut config = KilnConfig::default();
        config.global.platform = Some("x86_64-linux-gnu".to_string());
        config.global.project = "demo".to_string();
        Context::with_config(Workspace::new(self.root()), config)
            .unwrap()
            .with_build_system(Arc::new(StubBuildSystem))
    }

    pub(crate) fn target(&self, ctx: &Context, nv: &str) -> Port {
        Port::target(ctx, &NameVersion::parse(nv).unwrap()).unwrap()
    }
}
