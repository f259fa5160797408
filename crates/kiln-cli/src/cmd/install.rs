//! Install command
use std::time::Instant;

use anyhow::{Result, bail};
use kiln_core::{DepCheck, InstallOptions, Installer, Port};
use tracing::debug;

use super::{load_context, target_ports};

/// Install `ports`, or every port of the active project when empty.
///
/// Every port is checked for cycles and the whole set for version conflicts
/// before anything is built.
pub fn install(ports: &[String], options: InstallOptions) -> Result<()> {
    let ctx = load_context()?;

    let targets = if ports.is_empty() {
        let project = ctx.project();
        if project.ports().is_empty() {
            bail!(
                "No ports given and project '{}' lists none",
                project.name()
            );
        }
        project
            .ports()
            .iter()
            .map(|nv| Port::target(&ctx, nv))
            .collect::<kiln_core::Result<Vec<_>>>()?
    } else {
        target_ports(&ctx, ports)?
    };

    let reporter = ctx.reporter();
    reporter.section("Checking");
    let mut check = DepCheck::new(&ctx);
    for port in &targets {
        check.check_circular(port)?;
    }
    check.check_conflict(&targets)?;

    reporter.section("Installing");
    let start = Instant::now();
    let mut installer = Installer::new(&ctx, options);
    for port in &targets {
        installer.install(port)?;
    }

    let report = installer.into_report();
    if let Some(first) = targets.first() {
        let path = report.write(ctx.workspace(), first.name_version())?;
        debug!(report = %path.display(), "wrote install report");
    }
    reporter.summary(
        report.installed_count(),
        "installed",
        start.elapsed().as_secs_f64(),
    );
    Ok(())
}
