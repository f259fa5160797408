//! End-to-end tests for the kiln CLI binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway kiln workspace driven through the real binary.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        std::fs::write(
            temp_dir.path().join("kiln.toml"),
            "[global]\nplatform = \"x86_64-linux-gnu\"\nproject = \"demo\"\n",
        )
        .unwrap();
        Self { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a port whose build script installs `include/<name>.h`.
    fn port(&self, name: &str, version: &str, deps: &[&str]) {
        let dir = self.root().join("ports").join(name).join(version);
        std::fs::create_dir_all(&dir).unwrap();
        let deps = deps
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(
            dir.join("port.toml"),
            format!(
                "[package]\nurl = \"_\"\n\n[[build_configs]]\nbuild_system = \"custom\"\ndependencies = [{deps}]\nscript = 'mkdir -p \"$PREFIX/include\" && touch \"$PREFIX/include/{name}.h\"'\n"
            ),
        )
        .unwrap();
    }

    fn installed(&self, rel: &str) -> PathBuf {
        self.root()
            .join("installed/x86_64-linux-gnu@demo@release")
            .join(rel)
    }

    fn kiln(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_kiln"))
            .args(args)
            .env("KILN_WORKSPACE", self.root())
            .env_remove("RUST_LOG")
            .env_remove("KILN_CACHE_TOKEN")
            .output()
            .expect("failed to run kiln")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.kiln(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.kiln(&["--version"]).status.success());
}

#[test]
fn test_configure_updates_config() {
    let ctx = TestContext::new();
    let cache = ctx.root().join("cache");
    let output = ctx.kiln(&[
        "configure",
        "--build-type",
        "debug",
        "--cache-dir",
        cache.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let config = std::fs::read_to_string(ctx.root().join("kiln.toml")).unwrap();
    assert!(config.contains("platform = \"x86_64-linux-gnu\""));
    assert!(config.contains("build_type = \"Debug\""));
    assert!(config.contains("[cache_dir]"));
}

#[test]
fn test_configure_binary_cache_token() {
    let ctx = TestContext::new();
    let binary = ctx.root().join("binary");
    let dir = binary.to_str().unwrap();

    let output = ctx.kiln(&["configure", "--binary-cache-dir", dir, "--cache-token", "s3cret"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(binary.join("token").exists());

    // An existing token is never replaced.
    let output = ctx.kiln(&["configure", "--binary-cache-dir", dir, "--cache-token", "other"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_install_list_remove() {
    let ctx = TestContext::new();
    ctx.port("glog", "0.6.0", &["gflags@2.2.2"]);
    ctx.port("gflags", "2.2.2", &[]);

    let output = ctx.kiln(&["install", "glog@0.6.0"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("2 port(s) installed"));
    assert!(ctx.installed("include/glog.h").exists());
    assert!(ctx.installed("include/gflags.h").exists());

    let output = ctx.kiln(&["list"]);
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("glog"));
    assert!(listing.contains("gflags"));

    let output = ctx.kiln(&["install", "glog@0.6.0"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("0 port(s) installed"));

    let output = ctx.kiln(&["remove", "--recurse", "--purge", "glog@0.6.0"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!ctx.installed("include/glog.h").exists());
    assert!(!ctx.installed("include/gflags.h").exists());

    let output = ctx.kiln(&["list"]);
    assert!(stdout(&output).contains("No ports installed."));
}

#[test]
fn test_tree_command() {
    let ctx = TestContext::new();
    ctx.port("glog", "0.6.0", &["gflags@2.2.2"]);
    ctx.port("gflags", "2.2.2", &[]);

    let output = ctx.kiln(&["tree", "glog@0.6.0"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "glog@0.6.0\n└── gflags@2.2.2\n");
}

#[test]
fn test_install_rejects_cycles() {
    let ctx = TestContext::new();
    ctx.port("a", "1", &["b@1"]);
    ctx.port("b", "1", &["a@1"]);

    let output = ctx.kiln(&["install", "a@1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("circular dependency detected: a@1 -> b@1 -> a@1"));
    assert!(!ctx.root().join("packages").exists());
}

#[test]
fn test_install_rejects_conflicting_versions() {
    let ctx = TestContext::new();
    ctx.port("app", "1.0", &["zlib@1.2.13"]);
    ctx.port("zlib", "1.2.13", &[]);
    ctx.port("zlib", "1.3.1", &[]);

    let output = ctx.kiln(&["install", "app@1.0", "zlib@1.3.1"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("conflicting versions of ports detected"));
    assert!(err.contains("zlib@1.2.13 is defined in app@1.0"));
}

#[test]
fn test_install_without_ports_or_project() {
    let ctx = TestContext::new();
    let output = ctx.kiln(&["install"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("lists none"));
}

#[test]
fn test_unknown_port() {
    let ctx = TestContext::new();
    let output = ctx.kiln(&["install", "nowhere@0.1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("port nowhere@0.1 is not defined"));
}

#[test]
fn test_reverse_command() {
    let ctx = TestContext::new();
    ctx.port("glog", "0.6.0", &["gflags@2.2.2"]);
    ctx.port("folly", "2024.1", &["gflags@2.2.2", "glog@0.6.0"]);
    ctx.port("gflags", "2.2.2", &[]);

    let output = ctx.kiln(&["reverse", "gflags@2.2.2"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("folly@2024.1\nglog@0.6.0\n"));
    assert!(out.contains("Total: 2 port(s)"));

    let output = ctx.kiln(&["reverse", "folly@2024.1"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No reverse dependencies found."));
}

#[test]
fn test_clean_command_keeps_sources() {
    let ctx = TestContext::new();
    ctx.port("zlib", "1.3.1", &[]);
    let tree = ctx.root().join("buildtrees/zlib@1.3.1");
    std::fs::create_dir_all(tree.join("src")).unwrap();
    std::fs::create_dir_all(tree.join("x86_64-linux-gnu-demo-release")).unwrap();
    std::fs::write(tree.join("x86_64-linux-gnu-demo-release-build.log"), "").unwrap();

    let output = ctx.kiln(&["clean", "zlib@1.3.1"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("1 port(s) cleaned"));
    assert!(tree.join("src").exists());
    assert!(!tree.join("x86_64-linux-gnu-demo-release").exists());
    assert!(!tree.join("x86_64-linux-gnu-demo-release-build.log").exists());

    std::fs::create_dir_all(tree.join("x86_64-linux-gnu-demo-debug")).unwrap();
    let output = ctx.kiln(&["clean", "--all"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!tree.join("x86_64-linux-gnu-demo-debug").exists());
    assert!(tree.join("src").exists());
}
