//! Port definitions: where `port.toml` files live and which build config
//! applies to the current target.

use std::path::PathBuf;

use glob::Pattern;
use kiln_schema::{BuildConfig, NameVersion, PortFlags, PortManifest};
use tracing::debug;

use crate::context::Context;
use crate::error::{KilnError, Result};
use crate::port::{MatchedConfig, PortPaths};

/// Supplies the resolved configuration of a port.
pub trait PortRepository: Send + Sync {
    /// Resolve `nv` for the platform, project and build type of `ctx`.
    ///
    /// Fails with `PortNotFound`/`PortNotFoundIn` when no definition exists
    /// and `NoMatchedConfigFound` when none of its build configs apply.
    fn resolve(
        &self,
        ctx: &Context,
        nv: &NameVersion,
        flags: PortFlags,
        parent: Option<&NameVersion>,
    ) -> Result<MatchedConfig>;
}

/// Reads `port.toml` files from the workspace.
///
/// A project may override a port with
/// `conf/projects/<project>/<name>/<version>/port.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPortRepository;

impl FsPortRepository {
    fn locate(ctx: &Context, nv: &NameVersion) -> Option<PathBuf> {
        let ws = ctx.workspace();
        [
            ws.project_port_file(ctx.project().name(), nv),
            ws.port_file(nv),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

impl PortRepository for FsPortRepository {
    fn resolve(
        &self,
        ctx: &Context,
        nv: &NameVersion,
        flags: PortFlags,
        parent: Option<&NameVersion>,
    ) -> Result<MatchedConfig> {
        let Some(path) = Self::locate(ctx, nv) else {
            return Err(match parent {
                Some(parent) => KilnError::PortNotFoundIn {
                    port: nv.clone(),
                    parent: parent.clone(),
                },
                None => KilnError::PortNotFound(nv.clone()),
            });
        };
        debug!(port = %nv, file = %path.display(), "loading port");

        let manifest = PortManifest::from_file(&path).map_err(|e| KilnError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        match_config(ctx, nv, flags, manifest)
    }
}

fn pattern_matches(pattern: &str, target: &str) -> Result<bool> {
    let pattern = pattern.trim();
    if pattern.is_empty() || pattern == "*" {
        return Ok(true);
    }
    Ok(Pattern::new(pattern)?.matches(target))
}

/// Pick the build config of `manifest` that applies to `ctx`.
pub fn match_config(
    ctx: &Context,
    nv: &NameVersion,
    flags: PortFlags,
    manifest: PortManifest,
) -> Result<MatchedConfig> {
    let PortManifest {
        package,
        build_configs,
    } = manifest;

    if !package.supported_hosts.is_empty() {
        let mut supported = false;
        for host in &package.supported_hosts {
            supported |= pattern_matches(host, ctx.host_name())?;
        }
        if !supported {
            return Err(KilnError::UnsupportedHost {
                port: nv.clone(),
                host: ctx.host_name().to_string(),
            });
        }
    }

    let target = ctx.match_target(flags);
    let build = if build_configs.is_empty() {
        BuildConfig {
            build_system: "nobuild".to_string(),
            ..BuildConfig::default()
        }
    } else {
        let mut matched = None;
        for config in build_configs {
            if pattern_matches(&config.pattern, &target)? {
                matched = Some(config);
                break;
            }
        }
        matched.ok_or_else(|| KilnError::NoMatchedConfigFound {
            port: nv.clone(),
            target: target.clone(),
        })?
    };

    Ok(MatchedConfig {
        source: package,
        build,
        paths: PortPaths::new(ctx, nv, flags),
        host_name: ctx.host_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KilnConfig;
    use crate::paths::Workspace;

    const MULTI: &str = r#"
[package]
url = "https://github.com/madler/zlib.git"
ref = "v1.3.1"

[[build_configs]]
pattern = "*windows*"
build_system = "cmake"
options = ["-DZLIB_WINDOWS=ON"]

[[build_configs]]
pattern = "*linux*"
build_system = "cmake"
options = ["-DZLIB_LINUX=ON"]
"#;

    fn context(dir: &std::path::Path, platform: &str) -> Context {
        let mut config = KilnConfig::default();
        config.global.platform = Some(platform.to_string());
        config.global.project = "demo".into();
        Context::with_config(Workspace::new(dir), config).unwrap()
    }

    fn write(path: PathBuf, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_first_matching_config_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "x86_64-linux-gnu");
        let nv = NameVersion::new("zlib", "1.3.1");
        write(ctx.workspace().port_file(&nv), MULTI);

        let matched = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, None)
            .unwrap();
        assert_eq!(matched.build.options, vec!["-DZLIB_LINUX=ON"]);
        assert_eq!(
            matched.paths.package_dir,
            tmp.path().join("packages/zlib@1.3.1@x86_64-linux-gnu@demo@release")
        );
    }

    #[test]
    fn test_no_matched_config() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "aarch64-darwin");
        let nv = NameVersion::new("zlib", "1.3.1");
        write(ctx.workspace().port_file(&nv), MULTI);

        let err = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, None)
            .unwrap_err();
        assert!(matches!(err, KilnError::NoMatchedConfigFound { .. }));
    }

    #[test]
    fn test_project_override() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "x86_64-linux-gnu");
        let nv = NameVersion::new("zlib", "1.3.1");
        write(ctx.workspace().port_file(&nv), MULTI);
        write(
            ctx.workspace().project_port_file("demo", &nv),
            "[package]\nurl = \"file:///src/zlib\"\n",
        );

        let matched = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, None)
            .unwrap();
        assert_eq!(matched.source.url, "file:///src/zlib");
        assert!(matched.build.is_nobuild());
    }

    #[test]
    fn test_missing_port_names_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "x86_64-linux-gnu");
        let nv = NameVersion::new("gflags", "2.2.2");
        let parent = NameVersion::new("glog", "0.6.0");

        let err = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, Some(&parent))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "gflags@2.2.2 specified in glog@0.6.0 is not defined"
        );
        let err = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "port gflags@2.2.2 is not defined");
    }

    #[test]
    fn test_dev_port_matches_host() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "aarch64-none-elf");
        let nv = NameVersion::new("nasm", "2.16");
        let host_pattern = format!("{}*", std::env::consts::ARCH);
        write(
            ctx.workspace().port_file(&nv),
            &format!(
                "[package]\nurl = \"_\"\n\n[[build_configs]]\npattern = \"{host_pattern}\"\nbuild_system = \"makefiles\"\n"
            ),
        );

        let matched = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::DEV, None)
            .unwrap();
        assert_eq!(matched.paths.library_folder, ctx.host_folder());
        assert!(
            FsPortRepository
                .resolve(&ctx, &nv, PortFlags::TARGET, None)
                .is_err()
        );
    }

    #[test]
    fn test_unsupported_host() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), "x86_64-linux-gnu");
        let nv = NameVersion::new("msvc-runtime", "14");
        write(
            ctx.workspace().port_file(&nv),
            "[package]\nurl = \"_\"\nsupported_hosts = [\"no-such-host*\"]\n",
        );
        let err = FsPortRepository
            .resolve(&ctx, &nv, PortFlags::TARGET, None)
            .unwrap_err();
        assert!(matches!(err, KilnError::UnsupportedHost { .. }));
    }
}
