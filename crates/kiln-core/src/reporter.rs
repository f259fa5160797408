//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation.

use kiln_schema::NameVersion;

use crate::install::InstalledFrom;

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Checking", "Installing").
    fn section(&self, title: &str);

    /// A port is about to be installed. `host` marks ports of the host tree.
    fn installing(&self, port: &NameVersion, host: bool);

    /// A port was installed (or found installed) from `from`.
    fn installed(&self, port: &NameVersion, from: InstalledFrom);

    /// A port is about to be removed.
    fn removing(&self, port: &NameVersion);

    /// A port was removed.
    fn removed(&self, port: &NameVersion);

    /// Marks a port operation as failed with a specific reason.
    fn failed(&self, port: &NameVersion, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn installing(&self, port: &NameVersion, host: bool) {
        (**self).installing(port, host);
    }
    fn installed(&self, port: &NameVersion, from: InstalledFrom) {
        (**self).installed(port, from);
    }
    fn removing(&self, port: &NameVersion) {
        (**self).removing(port);
    }
    fn removed(&self, port: &NameVersion) {
        (**self).removed(port);
    }
    fn failed(&self, port: &NameVersion, reason: &str) {
        (**self).failed(port, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., dependency checks, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn installing(&self, _: &NameVersion, _: bool) {}
    fn installed(&self, _: &NameVersion, _: InstalledFrom) {}
    fn removing(&self, _: &NameVersion) {}
    fn removed(&self, _: &NameVersion) {}
    fn failed(&self, _: &NameVersion, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
