//! Colorized terminal reporter.

use std::io::Write;

use colored::Colorize;
use pharness::{ReportLevel, RunReporter};

/// Writes leveled lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

pub fn render(level: ReportLevel, message: &str) -> String {
    match level {
        ReportLevel::Header => format!("\n{}", format!("=== {message} ===").bold().blue()),
        ReportLevel::Section => format!("\n{}", format!(">> {message}").bold().cyan()),
        ReportLevel::Info => format!("{} {message}", "[INFO]".blue()),
        ReportLevel::Success => format!("{} {message}", "[SUCCESS]".green()),
        ReportLevel::Warn => format!("{} {message}", "[WARNING]".yellow()),
        ReportLevel::Error => format!("{} {message}", "[ERROR]".red()),
        ReportLevel::Debug => format!("{} {message}", "[DEBUG]".magenta()),
    }
}

impl RunReporter for ConsoleReporter {
    fn emit(&self, level: ReportLevel, message: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", render(level, message));
    }
}
