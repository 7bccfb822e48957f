//! Leveled, human-facing run output.
//!
//! ```rust
//! use pharness::{ReportLevel, RecordingRunReporter, RunReporter};
//!
//! let reporter = RecordingRunReporter::default();
//! reporter.section("login");
//! reporter.success("login succeeded");
//!
//! assert!(reporter.contains(ReportLevel::Success, "login succeeded"));
//! ```

use std::sync::Mutex;

use serde_json::Value;

use crate::{ResultTracker, WarningKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    Header,
    Section,
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

pub trait RunReporter: Send + Sync {
    fn emit(&self, level: ReportLevel, message: &str);

    fn header(&self, message: &str) {
        self.emit(ReportLevel::Header, message);
    }

    fn section(&self, message: &str) {
        self.emit(ReportLevel::Section, message);
    }

    fn info(&self, message: &str) {
        self.emit(ReportLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(ReportLevel::Success, message);
    }

    fn warn(&self, message: &str) {
        self.emit(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(ReportLevel::Error, message);
    }

    fn debug(&self, message: &str) {
        self.emit(ReportLevel::Debug, message);
    }

    fn debug_json(&self, label: &str, value: &Value) {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        self.debug(&format!("{label}: {rendered}"));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRunReporter;

impl RunReporter for NoopRunReporter {
    fn emit(&self, _level: ReportLevel, _message: &str) {}
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingRunReporter {
    lines: Mutex<Vec<(ReportLevel, String)>>,
}

impl RecordingRunReporter {
    pub fn lines(&self) -> Vec<(ReportLevel, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: ReportLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(line_level, line)| *line_level == level && line.contains(needle))
    }
}

impl RunReporter for RecordingRunReporter {
    fn emit(&self, level: ReportLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

/// Prints counts, rate, and every failing endpoint in record order.
pub fn report_summary(reporter: &dyn RunReporter, tracker: &ResultTracker) {
    let summary = tracker.summary();

    reporter.header("Test summary");
    reporter.info(&format!("Total checks: {}", summary.total));
    reporter.success(&format!("Passed: {}", summary.success));
    if summary.failure > 0 {
        reporter.error(&format!("Failed: {}", summary.failure));
    } else {
        reporter.info("Failed: 0");
    }
    reporter.info(&format!("Success rate: {:.2}%", summary.success_rate));

    if summary.not_implemented > 0 {
        reporter.info(&format!("Not implemented: {}", summary.not_implemented));
        for note in tracker.not_implemented() {
            reporter.info(&format!("  {}: {}", note.label, note.reason));
        }
    }
    if summary.skipped > 0 {
        reporter.warn(&format!("Skipped: {}", summary.skipped));
        for note in tracker.skipped() {
            reporter.warn(&format!("  {}: {}", note.label, note.reason));
        }
    }

    for warning in tracker.warnings() {
        let message = format!("{} ({}): {}", warning.label, warning.kind, warning.message);
        if warning.kind == WarningKind::TokenStillValid {
            reporter.error(&message);
        } else {
            reporter.warn(&message);
        }
    }

    if summary.failure > 0 {
        reporter.section("Failed endpoints");
        for line in tracker.failure_report() {
            reporter.error(&line);
        }
    }
}
