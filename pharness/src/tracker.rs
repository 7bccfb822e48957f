//! Pass/fail accounting for one run.
//!
//! Only decided outcomes count towards `total`; skipped and not-implemented
//! endpoints and warnings are tallied on the side so that
//! `total == success + failure` holds after every record call.
//!
//! ```rust
//! use pharness::{ResultTracker, WarningKind};
//!
//! let mut tracker = ResultTracker::new();
//! tracker.record_success("GET /health");
//! tracker.record_failure("POST /api/auth/login", "unexpected status 500");
//! tracker.record_not_implemented("GET /api/auth/me", "endpoint returned 404");
//! tracker.record_warning(WarningKind::TokenUnchanged, "POST /api/auth/refresh", "same token");
//!
//! let summary = tracker.summary();
//! assert_eq!((summary.total, summary.success, summary.failure), (2, 1, 1));
//! assert_eq!(summary.success_rate, 50.0);
//! assert_eq!(
//!     tracker.failure_report(),
//!     vec!["1. POST /api/auth/login: unexpected status 500".to_string()]
//! );
//! ```

use std::fmt::{Display, Formatter};

use pcommon::EndpointLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Refresh answered with the access token it was meant to replace.
    TokenUnchanged,
    /// A logged-out token was still accepted.
    TokenStillValid,
    Other,
}

impl Display for WarningKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WarningKind::TokenUnchanged => "token unchanged",
            WarningKind::TokenStillValid => "token still valid",
            WarningKind::Other => "warning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFailure {
    pub label: EndpointLabel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedNote {
    pub label: EndpointLabel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedWarning {
    pub kind: WarningKind,
    pub label: EndpointLabel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub not_implemented: usize,
    pub warnings: usize,
    pub token_still_valid: usize,
    /// Percentage of decided outcomes that passed; 0 when nothing was decided.
    pub success_rate: f64,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failure == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTracker {
    total: usize,
    success: usize,
    failure: usize,
    passed: Vec<EndpointLabel>,
    failures: Vec<TrackedFailure>,
    skipped: Vec<TrackedNote>,
    not_implemented: Vec<TrackedNote>,
    warnings: Vec<TrackedWarning>,
}

impl ResultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, label: impl Into<EndpointLabel>) {
        self.total += 1;
        self.success += 1;
        self.passed.push(label.into());
    }

    pub fn record_failure(&mut self, label: impl Into<EndpointLabel>, message: impl Into<String>) {
        self.total += 1;
        self.failure += 1;
        self.failures.push(TrackedFailure {
            label: label.into(),
            message: message.into(),
        });
    }

    pub fn record_skipped(&mut self, label: impl Into<EndpointLabel>, reason: impl Into<String>) {
        self.skipped.push(TrackedNote {
            label: label.into(),
            reason: reason.into(),
        });
    }

    pub fn record_not_implemented(
        &mut self,
        label: impl Into<EndpointLabel>,
        reason: impl Into<String>,
    ) {
        self.not_implemented.push(TrackedNote {
            label: label.into(),
            reason: reason.into(),
        });
    }

    pub fn record_warning(
        &mut self,
        kind: WarningKind,
        label: impl Into<EndpointLabel>,
        message: impl Into<String>,
    ) {
        self.warnings.push(TrackedWarning {
            kind,
            label: label.into(),
            message: message.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn success(&self) -> usize {
        self.success
    }

    pub fn failure(&self) -> usize {
        self.failure
    }

    pub fn passed(&self) -> &[EndpointLabel] {
        &self.passed
    }

    pub fn failures(&self) -> &[TrackedFailure] {
        &self.failures
    }

    pub fn skipped(&self) -> &[TrackedNote] {
        &self.skipped
    }

    pub fn not_implemented(&self) -> &[TrackedNote] {
        &self.not_implemented
    }

    pub fn warnings(&self) -> &[TrackedWarning] {
        &self.warnings
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &TrackedWarning> {
        self.warnings.iter().filter(move |warning| warning.kind == kind)
    }

    pub fn summary(&self) -> RunSummary {
        let success_rate = if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64 * 100.0
        };

        RunSummary {
            total: self.total,
            success: self.success,
            failure: self.failure,
            skipped: self.skipped.len(),
            not_implemented: self.not_implemented.len(),
            warnings: self.warnings.len(),
            token_still_valid: self.warnings_of(WarningKind::TokenStillValid).count(),
            success_rate,
        }
    }

    /// `"{n}. {label}: {message}"`, numbered from 1 in record order.
    pub fn failure_report(&self) -> Vec<String> {
        self.failures
            .iter()
            .enumerate()
            .map(|(index, failure)| format!("{}. {}: {}", index + 1, failure.label, failure.message))
            .collect()
    }
}
