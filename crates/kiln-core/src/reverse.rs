//! Reverse dependency lookup.
//!
//! Scans every port definition under `ports/` and reports the ones whose
//! matched build config lists a given port. Useful before removing or
//! bumping a port.

use kiln_schema::NameVersion;
use tracing::debug;
use walkdir::WalkDir;

use crate::context::Context;
use crate::depcheck::DepCheck;
use crate::error::{KilnError, Result};
use crate::paths::Workspace;
use crate::port::Port;

/// Every port with a `ports/<name>/<version>/port.toml`, sorted.
pub fn defined_ports(ws: &Workspace) -> Result<Vec<NameVersion>> {
    let ports_dir = ws.ports_dir();
    if !ports_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut ports = Vec::new();
    for entry in WalkDir::new(&ports_dir)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_name() != "port.toml" || !entry.file_type().is_file() {
            continue;
        }
        let Some(version_dir) = entry.path().parent() else {
            continue;
        };
        let name = version_dir.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str());
        let version = version_dir.file_name().and_then(|n| n.to_str());
        if let (Some(name), Some(version)) = (name, version) {
            ports.push(NameVersion::new(name, version));
        }
    }
    ports.sort();
    Ok(ports)
}

/// Ports that depend on `target`, sorted.
///
/// Only runtime dependencies count unless `dev` is set. Ports without a
/// build config for the current target are skipped. Every candidate is
/// validated for cycles and version conflicts first, so a broken graph
/// anywhere in the repository fails the lookup.
pub fn reverse_dependencies(ctx: &Context, target: &NameVersion, dev: bool) -> Result<Vec<NameVersion>> {
    let mut dependents = Vec::new();

    for nv in defined_ports(ctx.workspace())? {
        let port = match Port::target(ctx, &nv) {
            Ok(port) => port,
            Err(KilnError::NoMatchedConfigFound { .. } | KilnError::UnsupportedHost { .. }) => {
                debug!(port = %nv, "skipped: not available for this target");
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut check = DepCheck::new(ctx);
        check.check_circular(&port)?;
        check.check_conflict(std::slice::from_ref(&port))?;

        let matched = port.matched();
        if matched.dependencies().contains(target)
            || (dev && matched.dev_dependencies().contains(target))
        {
            dependents.push(nv);
        }
    }

    debug!(port = %target, dev, found = dependents.len(), "reverse lookup");
    Ok(dependents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn fixture() -> Fixture {
        let fx = Fixture::new();
        fx.port("glog@0.6.0", &["gflags@2.2.2"], &["cmake@3.30.5"]);
        fx.port("folly@2024.1", &["gflags@2.2.2", "glog@0.6.0"], &[]);
        fx.port("gflags@2.2.2", &[], &["cmake@3.30.5"]);
        fx.port("cmake@3.30.5", &[], &[]);
        fx
    }

    #[test]
    fn test_defined_ports() {
        let fx = fixture();
        let ports: Vec<String> = defined_ports(&Workspace::new(fx.root()))
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            ports,
            ["cmake@3.30.5", "folly@2024.1", "gflags@2.2.2", "glog@0.6.0"]
        );
    }

    #[test]
    fn test_defined_ports_without_ports_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(defined_ports(&Workspace::new(tmp.path())).unwrap().is_empty());
    }

    #[test]
    fn test_runtime_dependents() {
        let fx = fixture();
        let ctx = fx.context();
        let found = reverse_dependencies(&ctx, &NameVersion::new("gflags", "2.2.2"), false).unwrap();
        let found: Vec<String> = found.iter().map(ToString::to_string).collect();
        assert_eq!(found, ["folly@2024.1", "glog@0.6.0"]);
    }

    #[test]
    fn test_dev_dependents_need_dev_switch() {
        let fx = fixture();
        let ctx = fx.context();
        let cmake = NameVersion::new("cmake", "3.30.5");
        assert!(reverse_dependencies(&ctx, &cmake, false).unwrap().is_empty());

        let found: Vec<String> = reverse_dependencies(&ctx, &cmake, true)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(found, ["gflags@2.2.2", "glog@0.6.0"]);
    }

    #[test]
    fn test_ports_without_matching_config_are_skipped() {
        let fx = fixture();
        fx.write_port(
            "winapi@1.0",
            "[package]\nurl = \"_\"\n\n[[build_configs]]\npattern = \"*windows*\"\nbuild_system = \"cmake\"\ndependencies = [\"gflags@2.2.2\"]\n",
        );
        let ctx = fx.context();
        let found = reverse_dependencies(&ctx, &NameVersion::new("gflags", "2.2.2"), false).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_cycle_anywhere_fails_the_lookup() {
        let fx = fixture();
        fx.port("a@1", &["b@1"], &[]);
        fx.port("b@1", &["a@1"], &[]);
        let ctx = fx.context();
        let err = reverse_dependencies(&ctx, &NameVersion::new("gflags", "2.2.2"), false).unwrap_err();
        assert!(matches!(err, KilnError::CircularDependency(_)));
    }
}
