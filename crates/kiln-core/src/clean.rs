//! Build cache cleanup.
//!
//! Deletes build dirs and build logs under `buildtrees/` without touching
//! fetched sources, packages or installed files.

use std::collections::HashSet;

use kiln_schema::{NameVersion, PortFlags};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{IoContext, Result};
use crate::graph::{DependencyWalker, NodeKey};
use crate::port::Port;
use crate::remove::remove_build_cache;

/// Cleans ports one graph node at a time; each node is cleaned once.
#[derive(Debug)]
pub struct Cleaner<'a> {
    ctx: &'a Context,
    recurse: bool,
    cleaned: Vec<NodeKey>,
    seen: HashSet<NodeKey>,
}

impl<'a> Cleaner<'a> {
    pub fn new(ctx: &'a Context, recurse: bool) -> Self {
        Self {
            ctx,
            recurse,
            cleaned: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Clean `port`, then its dependencies and dev dependencies when
    /// recursing.
    pub fn clean(&mut self, port: &Port) -> Result<()> {
        let key = port.key();
        if !self.seen.insert(key.clone()) {
            return Ok(());
        }

        let removed = remove_build_cache(port)?;
        debug!(port = %key, removed, "cleaned build cache");
        self.cleaned.push(key);

        if self.recurse {
            for (_, child) in DependencyWalker::new(self.ctx).children(port)? {
                self.clean(&child)?;
            }
        }
        Ok(())
    }

    /// Nodes cleaned so far, in visiting order.
    pub fn cleaned(&self) -> &[NodeKey] {
        &self.cleaned
    }

    pub fn into_cleaned(self) -> Vec<NodeKey> {
        self.cleaned
    }
}

/// Clean `nv` built for the target, or for the host when `dev` is set.
pub fn clean(ctx: &Context, nv: &NameVersion, dev: bool, recurse: bool) -> Result<Vec<NodeKey>> {
    let flags = if dev { PortFlags::DEV } else { PortFlags::TARGET };
    let port = Port::init(ctx, nv, flags, None)?;
    let mut cleaner = Cleaner::new(ctx, recurse);
    cleaner.clean(&port)?;
    Ok(cleaner.into_cleaned())
}

/// Clean every port of the active project, both its target and host builds.
pub fn clean_project(ctx: &Context, recurse: bool) -> Result<Vec<NodeKey>> {
    let mut cleaner = Cleaner::new(ctx, recurse);
    for nv in ctx.project().ports() {
        for flags in [PortFlags::TARGET, PortFlags::DEV] {
            let port = Port::init(ctx, nv, flags, None)?;
            cleaner.clean(&port)?;
        }
    }
    Ok(cleaner.into_cleaned())
}

/// Delete everything under `buildtrees/<nv>/` except fetched sources, for
/// every port, defined or not. Returns the ports that had something deleted.
pub fn clean_all(ctx: &Context) -> Result<Vec<NameVersion>> {
    let buildtrees = ctx.workspace().buildtrees_dir();
    let entries = match std::fs::read_dir(&buildtrees) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut cleaned = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(nv) = NameVersion::parse(&entry.file_name().to_string_lossy()) else {
            continue;
        };

        let mut removed = false;
        for item in std::fs::read_dir(entry.path())? {
            let item = item?;
            if item.file_name() == "src" {
                continue;
            }
            let path = item.path();
            if item.file_type()?.is_dir() {
                std::fs::remove_dir_all(&path).io_context("removing build dir", &path)?;
            } else {
                std::fs::remove_file(&path).io_context("removing build log", &path)?;
            }
            removed = true;
        }
        if removed {
            cleaned.push(nv);
        }
    }

    cleaned.sort();
    info!(ports = cleaned.len(), "cleaned all build caches");
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn touch(path: std::path::PathBuf) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    /// Give `port` a build dir, a build log and fetched sources.
    fn build_leftovers(port: &Port) {
        let paths = port.paths();
        touch(paths.build_dir.join("CMakeCache.txt"));
        touch(paths.log_file("build").unwrap());
        touch(paths.repo_dir.join("CMakeLists.txt"));
    }

    #[test]
    fn test_clean_keeps_sources_and_packages() {
        let fx = Fixture::new();
        fx.port("zlib@1.3.1", &[], &[]);
        let ctx = fx.context();
        let zlib = fx.target(&ctx, "zlib@1.3.1");
        build_leftovers(&zlib);
        touch(zlib.package_dir().join("include/zlib.h"));

        let cleaned = clean(&ctx, zlib.name_version(), false, false).unwrap();
        assert_eq!(cleaned, vec![zlib.key()]);

        let paths = zlib.paths();
        assert!(!paths.build_dir.exists());
        assert!(!paths.log_file("build").unwrap().exists());
        assert!(paths.repo_dir.join("CMakeLists.txt").exists());
        assert!(zlib.package_dir().join("include/zlib.h").exists());
    }

    #[test]
    fn test_dev_clean_leaves_target_build() {
        let fx = Fixture::new();
        fx.port("cmake@3.30.5", &[], &[]);
        let ctx = fx.context();
        let nv = NameVersion::new("cmake", "3.30.5");
        let target = fx.target(&ctx, "cmake@3.30.5");
        let host = Port::init(&ctx, &nv, PortFlags::DEV, None).unwrap();
        build_leftovers(&target);
        build_leftovers(&host);

        let cleaned = clean(&ctx, &nv, true, false).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].to_string(), "cmake@3.30.5@dev");
        assert!(!host.paths().build_dir.exists());
        assert!(target.paths().build_dir.exists());
    }

    #[test]
    fn test_recursive_clean_follows_both_edge_kinds() {
        let fx = Fixture::new();
        fx.port("glog@0.6.0", &["gflags@2.2.2"], &["cmake@3.30.5"]);
        fx.port("gflags@2.2.2", &[], &["cmake@3.30.5"]);
        fx.port("cmake@3.30.5", &[], &[]);
        let ctx = fx.context();
        let glog = fx.target(&ctx, "glog@0.6.0");

        let cleaned: Vec<String> = clean(&ctx, glog.name_version(), false, true)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(cleaned, ["glog@0.6.0", "cmake@3.30.5@dev", "gflags@2.2.2"]);
    }

    #[test]
    fn test_clean_project_covers_target_and_host() {
        let fx = Fixture::new();
        fx.port("zlib@1.3.1", &[], &[]);
        std::fs::create_dir_all(fx.root().join("conf/projects")).unwrap();
        std::fs::write(
            fx.root().join("conf/projects/demo.toml"),
            "ports = [\"zlib@1.3.1\"]\n",
        )
        .unwrap();
        let ctx = fx.context();

        let cleaned: Vec<String> = clean_project(&ctx, false)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(cleaned, ["zlib@1.3.1", "zlib@1.3.1@dev"]);
    }

    #[test]
    fn test_clean_all_keeps_src() {
        let fx = Fixture::new();
        let ctx = fx.context();
        let buildtrees = ctx.workspace().buildtrees_dir();
        touch(buildtrees.join("zlib@1.3.1/src/zlib.c"));
        touch(buildtrees.join("zlib@1.3.1/x86_64-linux-gnu-demo-release/Makefile"));
        touch(buildtrees.join("zlib@1.3.1/x86_64-linux-gnu-demo-release-build.log"));
        touch(buildtrees.join("gone@1.0/src/gone.c"));

        let cleaned = clean_all(&ctx).unwrap();
        assert_eq!(cleaned, vec![NameVersion::new("zlib", "1.3.1")]);
        assert!(buildtrees.join("zlib@1.3.1/src/zlib.c").exists());
        assert!(!buildtrees.join("zlib@1.3.1/x86_64-linux-gnu-demo-release").exists());
        assert!(!buildtrees.join("zlib@1.3.1/x86_64-linux-gnu-demo-release-build.log").exists());
        assert!(buildtrees.join("gone@1.0/src/gone.c").exists());
    }

    #[test]
    fn test_clean_all_without_buildtrees() {
        let fx = Fixture::new();
        let ctx = fx.context();
        assert!(clean_all(&ctx).unwrap().is_empty());
    }
}
