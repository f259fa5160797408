#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kiln_core::{BuildSystem, Context, Port, Result, Workspace};
use kiln_schema::{NameVersion, PortFlags};
use tempfile::TempDir;

pub const PLATFORM: &str = "x86_64-linux-gnu";
pub const PROJECT: &str = "demo";

/// Fake build system: records every build and writes a numbered artifact.
#[derive(Debug, Default)]
pub struct RecordingBuildSystem {
    builds: Mutex<Vec<String>>,
    commits: Mutex<HashMap<String, String>>,
}

impl RecordingBuildSystem {
    pub fn builds_of(&self, key: &str) -> usize {
        self.builds.lock().unwrap().iter().filter(|b| *b == key).count()
    }

    pub fn total_builds(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    pub fn set_commit(&self, nv: &str, commit: &str) {
        self.commits
            .lock()
            .unwrap()
            .insert(nv.to_string(), commit.to_string());
    }
}

impl BuildSystem for RecordingBuildSystem {
    fn fetch(&self, _: &Context, _: &Port) -> Result<()> {
        Ok(())
    }

    fn commit(&self, _: &Context, port: &Port) -> Result<String> {
        let commits = self.commits.lock().unwrap();
        Ok(commits
            .get(&port.name_version().to_string())
            .cloned()
            .unwrap_or_else(|| "rev-1".to_string()))
    }

    fn build(&self, _: &Context, port: &Port) -> Result<()> {
        let mut builds = self.builds.lock().unwrap();
        builds.push(port.key().to_string());
        let serial = builds.len();

        let package = port.package_dir();
        if package.exists() {
            std::fs::remove_dir_all(package)?;
        }
        std::fs::create_dir_all(package.join("lib"))?;
        std::fs::create_dir_all(package.join("include"))?;
        std::fs::write(
            package.join("lib").join(format!("lib{}.a", port.name())),
            format!("build #{serial}"),
        )?;
        std::fs::write(
            package.join("include").join(format!("{}.h", port.name())),
            "#pragma once\n",
        )?;
        Ok(())
    }
}

pub struct TestWorkspace {
    dir: TempDir,
    pub builder: Arc<RecordingBuildSystem>,
    extra_config: Mutex<String>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
            builder: Arc::new(RecordingBuildSystem::default()),
            extra_config: Mutex::new(String::new()),
        };
        ws.write_config();
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.root())
    }

    fn write_config(&self) {
        let extra = self.extra_config.lock().unwrap();
        std::fs::write(
            self.workspace().config_file(),
            format!("[global]\nplatform = \"{PLATFORM}\"\nproject = \"{PROJECT}\"\n{extra}"),
        )
        .unwrap();
    }

    /// Append sections to `kiln.toml`.
    pub fn configure(&self, toml: &str) {
        self.extra_config.lock().unwrap().push_str(toml);
        self.write_config();
    }

    pub fn project(&self, ports: &[&str]) {
        let ws = self.workspace();
        std::fs::create_dir_all(ws.projects_dir()).unwrap();
        let list = ports
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(ws.project_file(PROJECT), format!("ports = [{list}]\n")).unwrap();
    }

    pub fn port_toml(&self, nv: &str, content: &str) {
        let path = self.workspace().port_file(&NameVersion::parse(nv).unwrap());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn port(&self, nv: &str, deps: &[&str], dev_deps: &[&str]) {
        let quote = |items: &[&str]| {
            items
                .iter()
                .map(|s| format!("\"{s}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.port_toml(
            nv,
            &format!(
                "[package]\nurl = \"https://example.com/{nv}.git\"\n\n[[build_configs]]\npattern = \"*\"\nbuild_system = \"cmake\"\ndependencies = [{}]\ndev_dependencies = [{}]\n",
                quote(deps),
                quote(dev_deps)
            ),
        );
    }

    pub fn context(&self) -> Context {
        Context::load(self.workspace())
            .unwrap()
            .with_build_system(self.builder.clone())
    }

    pub fn target(&self, ctx: &Context, nv: &str) -> Port {
        Port::target(ctx, &NameVersion::parse(nv).unwrap()).unwrap()
    }

    pub fn dev(&self, ctx: &Context, nv: &str) -> Port {
        Port::init(ctx, &NameVersion::parse(nv).unwrap(), PortFlags::DEV, None).unwrap()
    }

    pub fn target_tree(&self) -> PathBuf {
        self.root()
            .join("installed")
            .join(format!("{PLATFORM}@{PROJECT}@release"))
    }

    /// Installed static library of a target port.
    pub fn installed_lib(&self, name: &str) -> PathBuf {
        self.target_tree().join("lib").join(format!("lib{name}.a"))
    }

    pub fn read_installed_lib(&self, name: &str) -> String {
        std::fs::read_to_string(self.installed_lib(name)).unwrap()
    }
}
