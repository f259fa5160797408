//! Install reports: a JSON record of every port an install touched.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use kiln_schema::{BuildType, NameVersion};
use serde::Serialize;

use crate::context::Context;
use crate::error::{IoContext, Result};
use crate::install::InstalledFrom;
use crate::paths::Workspace;
use crate::port::Port;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name_version: NameVersion,
    pub host: bool,
    pub library_folder: String,
    pub from: InstalledFrom,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub platform: String,
    pub project: String,
    pub build_type: BuildType,
    pub started_at: DateTime<Utc>,
    /// In completion order: dependencies before dependents.
    pub ports: Vec<ReportEntry>,
}

impl InstallReport {
    pub fn new(ctx: &Context) -> Self {
        Self {
            platform: ctx.platform().to_string(),
            project: ctx.project().name().to_string(),
            build_type: ctx.build_type(),
            started_at: Utc::now(),
            ports: Vec::new(),
        }
    }

    pub fn record(&mut self, port: &Port, from: InstalledFrom) {
        self.ports.push(ReportEntry {
            name_version: port.name_version().clone(),
            host: port.is_host(),
            library_folder: port.paths().library_folder.clone(),
            from,
        });
    }

    /// Ports that were actually installed, as opposed to found installed.
    pub fn installed_count(&self) -> usize {
        self.ports
            .iter()
            .filter(|e| e.from != InstalledFrom::Preinstalled)
            .count()
    }

    pub fn from_of(&self, nv: &NameVersion) -> Option<InstalledFrom> {
        self.ports
            .iter()
            .find(|e| &e.name_version == nv)
            .map(|e| e.from)
    }

    /// Write the report under `installed/kiln/reports/`.
    pub fn write(&self, workspace: &Workspace, root: &NameVersion) -> Result<PathBuf> {
        let path = workspace.report_path(root);
        std::fs::create_dir_all(workspace.reports_dir())?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).io_context("writing install report", &path)?;
        Ok(path)
    }
}
