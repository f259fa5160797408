//! Configure command
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use kiln_core::{BinaryCache, Reporter};
use kiln_core::config::{BinaryCacheConfig, CacheDirConfig, KilnConfig, PackageCacheConfig};
use kiln_schema::BuildType;

use super::workspace;
use crate::ui::Output;

#[derive(Debug, Default)]
pub struct ConfigureArgs {
    pub platform: Option<String>,
    pub project: Option<String>,
    pub build_type: Option<String>,
    pub jobs: Option<usize>,
    pub package_cache_dir: Option<PathBuf>,
    pub package_cache_writable: bool,
    pub binary_cache_dir: Option<PathBuf>,
    pub cache_token: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Apply `args` to `config`. Fields not given are left as they are.
pub fn apply(config: &mut KilnConfig, args: &ConfigureArgs) -> Result<()> {
    if let Some(platform) = &args.platform {
        config.global.platform = Some(platform.clone());
    }
    if let Some(project) = &args.project {
        config.global.project.clone_from(project);
    }
    if let Some(build_type) = &args.build_type {
        config.global.build_type = build_type
            .parse::<BuildType>()
            .with_context(|| format!("Invalid build type '{build_type}'"))?;
    }
    if let Some(jobs) = args.jobs {
        config.global.jobs = Some(jobs);
    }
    if let Some(dir) = &args.package_cache_dir {
        config.package_cache = Some(PackageCacheConfig {
            dir: dir.clone(),
            writable: args.package_cache_writable,
        });
    }
    if let Some(dir) = &args.binary_cache_dir {
        config.binary_cache = Some(BinaryCacheConfig { dir: dir.clone() });
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(CacheDirConfig { dir: dir.clone() });
    }
    Ok(())
}

pub fn configure(args: &ConfigureArgs) -> Result<()> {
    let ws = workspace()?;
    let path = ws.config_file();
    let mut config = KilnConfig::load(&path)?;
    apply(&mut config, args)?;
    config.save(&path)?;

    let output = Output::new();
    if let (Some(dir), Some(token)) = (&args.binary_cache_dir, &args.cache_token) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        BinaryCache::new(dir).set_token(token)?;
        output.success("Binary cache token set");
    }
    output.success(&format!("Updated {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut config = KilnConfig::default();
        config.global.platform = Some("aarch64-linux-gnu".into());

        apply(
            &mut config,
            &ConfigureArgs {
                project: Some("demo".into()),
                build_type: Some("debug".into()),
                package_cache_dir: Some("/mnt/pkgs".into()),
                package_cache_writable: true,
                ..ConfigureArgs::default()
            },
        )
        .unwrap();

        assert_eq!(config.global.platform.as_deref(), Some("aarch64-linux-gnu"));
        assert_eq!(config.global.project, "demo");
        assert_eq!(config.global.build_type, BuildType::Debug);
        assert!(config.package_cache.as_ref().unwrap().writable);
        assert!(config.binary_cache.is_none());
    }

    #[test]
    fn test_apply_rejects_unknown_build_type() {
        let mut config = KilnConfig::default();
        let err = apply(
            &mut config,
            &ConfigureArgs {
                build_type: Some("fast".into()),
                ..ConfigureArgs::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("fast"));
    }
}
