//! Trace records: which files a port installed into which tree.
//!
//! One file per installed port and library folder,
//! `installed/kiln/trace/<name@version>@<library folder>.trace`, listing the
//! installed files relative to `installed/`. Its presence is what "installed"
//! means; removal deletes exactly the files it lists.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use kiln_schema::NameVersion;
use tracing::warn;

use crate::error::{IoContext, Result};
use crate::paths::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub name_version: NameVersion,
    pub library_folder: String,
    /// Installed files, relative to `installed/`.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TraceStore {
    dir: PathBuf,
}

impl TraceStore {
    pub fn new(workspace: &Workspace) -> Self {
        Self {
            dir: workspace.trace_dir(),
        }
    }

    pub fn path(&self, nv: &NameVersion, library_folder: &str) -> PathBuf {
        self.dir.join(format!("{nv}@{library_folder}.trace"))
    }

    pub fn write(&self, record: &TraceRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut content = String::new();
        for file in &record.files {
            content.push_str(&file.to_string_lossy());
            content.push('\n');
        }
        let path = self.path(&record.name_version, &record.library_folder);
        std::fs::write(&path, content).io_context("writing trace file", &path)
    }

    pub fn read(&self, nv: &NameVersion, library_folder: &str) -> Result<Option<TraceRecord>> {
        let path = self.path(nv, library_folder);
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                files.push(PathBuf::from(line));
            }
        }
        Ok(Some(TraceRecord {
            name_version: nv.clone(),
            library_folder: library_folder.to_string(),
            files,
        }))
    }

    pub fn remove(&self, nv: &NameVersion, library_folder: &str) -> Result<()> {
        let path = self.path(nv, library_folder);
        if path.exists() {
            std::fs::remove_file(&path).io_context("removing trace file", &path)?;
        }
        Ok(())
    }

    /// Ports with a trace record in `library_folder`, sorted.
    pub fn list(&self, library_folder: &str) -> Result<Vec<NameVersion>> {
        let suffix = format!("@{library_folder}.trace");
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ports = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(nv) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) else {
                continue;
            };
            match NameVersion::parse(nv) {
                Ok(nv) => ports.push(nv),
                Err(e) => warn!(file = ?name, "ignoring trace file: {e}"),
            }
        }
        ports.sort();
        Ok(ports)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
