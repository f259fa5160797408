//! Build-system adapters.
//!
//! The install pipeline only needs three things from a build system: fetch
//! the sources, name the revision it fetched, and build an install tree into
//! the port's package dir. What happens inside a build is opaque to it.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::context::Context;
use crate::error::{IoContext, KilnError, Result};
use crate::port::Port;

/// Fetches and builds ports.
pub trait BuildSystem: Send + Sync {
    /// Make the sources available in the port's repo dir.
    fn fetch(&self, ctx: &Context, port: &Port) -> Result<()>;

    /// Revision of the sources that `build` would use.
    fn commit(&self, ctx: &Context, port: &Port) -> Result<String>;

    /// Build the port and install the result into its package dir.
    /// Dependencies are already installed when this runs.
    fn build(&self, ctx: &Context, port: &Port) -> Result<()>;
}

/// Runs a port's shell recipe with `/bin/sh`.
///
/// Ports may carry a `script`; otherwise a minimal recipe is derived from
/// `build_system` for `cmake`, `meson` and `makefiles`. The environment is
/// cleared and rebuilt:
///
/// | Variable        | Value                                   |
/// |-----------------|-----------------------------------------|
/// | `PREFIX`        | package dir                             |
/// | `SRC_DIR`       | fetched sources (plus `src_dir`)        |
/// | `BUILD_DIR`     | out-of-source build dir                 |
/// | `BUILD_TYPE`    | `Release`, `Debug`, ...                 |
/// | `JOBS`          | parallel jobs                           |
/// | `OPTIONS`       | build config options, space separated   |
/// | `DEPS_DIR`      | installed tree the port links against   |
/// | `HOST_DEPS_DIR` | installed host tree (dev tools)         |
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellBuildSystem;

/// Sources that need no fetching.
fn is_virtual(url: &str) -> bool {
    url.is_empty() || url == "_"
}

fn local_source(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    let path = Path::new(url);
    (path.is_absolute() && path.exists()).then(|| path.to_path_buf())
}

fn default_recipe(build_system: &str) -> Option<&'static str> {
    match build_system {
        "cmake" => Some(
            "cmake -S \"$SRC_DIR\" -B \"$BUILD_DIR\" -DCMAKE_INSTALL_PREFIX=\"$PREFIX\" \
             -DCMAKE_BUILD_TYPE=\"$BUILD_TYPE\" -DCMAKE_PREFIX_PATH=\"$DEPS_DIR\" $OPTIONS \
             && cmake --build \"$BUILD_DIR\" --parallel \"$JOBS\" \
             && cmake --install \"$BUILD_DIR\"",
        ),
        "meson" => Some(
            "meson setup \"$BUILD_DIR\" \"$SRC_DIR\" --prefix=\"$PREFIX\" $OPTIONS \
             && meson compile -C \"$BUILD_DIR\" -j \"$JOBS\" \
             && meson install -C \"$BUILD_DIR\"",
        ),
        "makefiles" => Some(
            "cd \"$SRC_DIR\" && ./configure --prefix=\"$PREFIX\" $OPTIONS \
             && make -j\"$JOBS\" && make install",
        ),
        _ => None,
    }
}

/// Hash a source tree: relative paths and contents, in sorted order.
fn tree_digest(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update(std::fs::read(entry.path())?);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let git = which::which("git").map_err(|e| KilnError::context("git not found", e))?;
    let mut cmd = Command::new(git);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .map_err(|e| KilnError::context("failed to execute git", e))?;
    if !output.status.success() {
        return Err(KilnError::context(
            "git failed",
            format!(
                "git {}: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Recursively copy a directory tree from `src` to `dst`.
pub fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(dst.as_ref())?;
    fs_extra::dir::copy(
        src,
        dst,
        &fs_extra::dir::CopyOptions::new()
            .content_only(true)
            .overwrite(true),
    )
    .map_err(|e| KilnError::context("copy failed", e))?;
    Ok(())
}

/// Read the last `n` lines of a log.
fn read_last_lines(path: &Path, n: usize) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return String::new();
    };
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

impl BuildSystem for ShellBuildSystem {
    fn fetch(&self, _ctx: &Context, port: &Port) -> Result<()> {
        let source = port.source();
        let repo_dir = &port.paths().repo_dir;

        if is_virtual(&source.url) {
            std::fs::create_dir_all(repo_dir)?;
            return Ok(());
        }
        if std::fs::read_dir(repo_dir).is_ok_and(|mut d| d.next().is_some()) {
            debug!(port = %port.name_version(), "sources already fetched");
            return Ok(());
        }

        if let Some(local) = local_source(&source.url) {
            info!(port = %port.name_version(), from = %local.display(), "copying sources");
            return copy_dir_all(&local, repo_dir);
        }

        info!(port = %port.name_version(), url = %source.url, "cloning sources");
        if let Some(parent) = repo_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let repo = repo_dir.to_string_lossy().to_string();
        let depth = source.depth.to_string();
        let mut args = vec!["clone"];
        if !source.reference.is_empty() {
            args.extend(["--branch", source.reference.as_str()]);
        }
        // A pinned commit may be older than a shallow clone reaches.
        if source.depth > 0 && source.commit.is_none() {
            args.extend(["--depth", depth.as_str()]);
        }
        args.extend([source.url.as_str(), repo.as_str()]);
        run_git(&args, None)?;

        if let Some(commit) = &source.commit {
            run_git(&["checkout", commit.as_str()], Some(repo_dir))?;
        }
        Ok(())
    }

    fn commit(&self, ctx: &Context, port: &Port) -> Result<String> {
        let source = port.source();
        if is_virtual(&source.url) {
            return Ok("_".to_string());
        }
        if let Some(local) = local_source(&source.url) {
            return Ok(format!("file:{}", tree_digest(&local)?));
        }
        self.fetch(ctx, port)?;
        run_git(&["rev-parse", "HEAD"], Some(&port.paths().repo_dir))
    }

    fn build(&self, ctx: &Context, port: &Port) -> Result<()> {
        let matched = port.matched();
        let paths = &matched.paths;
        let nv = port.name_version();

        if paths.package_dir.exists() {
            std::fs::remove_dir_all(&paths.package_dir)?;
        }
        std::fs::create_dir_all(&paths.package_dir)?;

        let script = if matched.build.script.trim().is_empty() {
            match default_recipe(&matched.build.build_system) {
                Some(recipe) => recipe.to_string(),
                None if port.is_nobuild() => return Ok(()),
                None => {
                    return Err(KilnError::build(
                        nv,
                        format!(
                            "no script given and no default recipe for build system '{}'",
                            matched.build.build_system
                        ),
                    ));
                }
            }
        } else {
            matched.build.script.clone()
        };

        self.fetch(ctx, port)?;
        std::fs::create_dir_all(&paths.build_dir)?;

        let src_dir = if matched.source.src_dir.is_empty() {
            paths.repo_dir.clone()
        } else {
            paths.repo_dir.join(&matched.source.src_dir)
        };
        let deps_dir = paths.installed_dir.clone();
        let host_deps_dir = ctx.workspace().installed_dir().join(ctx.host_folder());
        let path_env = format!(
            "{}:/usr/local/bin:/usr/bin:/bin",
            host_deps_dir.join("bin").display()
        );
        let pkg_config_path = format!(
            "{}:{}",
            deps_dir.join("lib/pkgconfig").display(),
            deps_dir.join("share/pkgconfig").display()
        );

        let mut cmd = Command::new("/bin/sh");

        // Start from a blank slate so host env vars never leak in.
        cmd.env_clear();

        cmd.arg("-c")
            .arg(&script)
            .current_dir(&paths.build_dir)
            .env("PATH", path_env)
            .env("HOME", std::env::var_os("HOME").unwrap_or_default())
            .env("TERM", "dumb")
            .env("LANG", "C.UTF-8")
            .env("PREFIX", &paths.package_dir)
            .env("SRC_DIR", &src_dir)
            .env("BUILD_DIR", &paths.build_dir)
            .env("BUILD_TYPE", ctx.build_type().as_str())
            .env("JOBS", ctx.jobs().to_string())
            .env("OPTIONS", matched.build.options.join(" "))
            .env("DEPS_DIR", &deps_dir)
            .env("HOST_DEPS_DIR", &host_deps_dir)
            .env("PKG_CONFIG_PATH", pkg_config_path);
        for (key, value) in &matched.build.env {
            cmd.env(key, value);
        }

        let log_path = paths
            .log_file("build")
            .ok_or_else(|| KilnError::build(nv, "invalid build dir"))?;
        let log_file = std::fs::File::create(&log_path).io_context("creating build log", &log_path)?;
        info!(port = %nv, log = %log_path.display(), "building");
        let status = cmd
            .stdout(Stdio::from(log_file.try_clone()?))
            .stderr(Stdio::from(log_file))
            .status()
            .map_err(|e| KilnError::build(nv, format!("failed to execute build script: {e}")))?;

        if !status.success() {
            let tail = read_last_lines(&log_path, 20);
            return Err(KilnError::build(
                nv,
                format!(
                    "build script exited with {:?}, see {}\n{tail}",
                    status.code(),
                    log_path.display()
                ),
            ));
        }
        Ok(())
    }
}
