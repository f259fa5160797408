//! Line-oriented terminal reporter.
//!
//! Writes are serialized through a lock so reports from different threads
//! never interleave within a line.

use std::io::Write;
use std::sync::Mutex;

use crossterm::style::Stylize;
use kiln_core::{InstalledFrom, Reporter};
use kiln_schema::NameVersion;

#[derive(Debug, Default)]
pub struct Output {
    lock: Mutex<()>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, text: &str) {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{text}");
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.line(&format!("\n{}", title.bold()));
    }

    fn installing(&self, port: &NameVersion, host: bool) {
        let marker = if host { " (host)" } else { "" };
        self.line(&format!(
            "  {} {}{}",
            "→".cyan(),
            port,
            marker.dark_grey()
        ));
    }

    fn installed(&self, port: &NameVersion, from: InstalledFrom) {
        self.line(&format!(
            "  {} {} {}",
            "✓".green(),
            port,
            format!("({from})").dark_grey()
        ));
    }

    fn removing(&self, port: &NameVersion) {
        self.line(&format!("  {} {}", "-".yellow(), port));
    }

    fn removed(&self, port: &NameVersion) {
        self.line(&format!(
            "  {} {} {}",
            "✓".green(),
            port,
            "(removed)".dark_grey()
        ));
    }

    fn failed(&self, port: &NameVersion, reason: &str) {
        self.line(&format!("  {} {} {}", "✗".red(), port, reason.red()));
    }

    fn info(&self, msg: &str) {
        self.line(&format!("  {msg}"));
    }

    fn success(&self, msg: &str) {
        self.line(&format!("  {} {}", "✓".green(), msg));
    }

    fn warning(&self, msg: &str) {
        self.line(&format!("  {} {}", "⚠".yellow(), msg.yellow()));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        self.line(&format!(
            "\n  {} {count} port(s) {action} in {elapsed_secs:.1}s",
            "✓".green()
        ));
    }
}
