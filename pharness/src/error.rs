//! Harness-level error types and conversion helpers.
//!
//! ```rust
//! use pharness::{HarnessError, HarnessErrorKind};
//!
//! let err = HarnessError::protocol("login response is missing refreshToken");
//! assert_eq!(err.kind, HarnessErrorKind::Protocol);
//! assert!(err.to_string().contains("refreshToken"));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use ptransport::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessErrorKind {
    InvalidRequest,
    HealthCheck,
    Authentication,
    NotAuthenticated,
    Protocol,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessError {
    pub kind: HarnessErrorKind,
    pub message: String,
}

impl HarnessError {
    pub fn new(kind: HarnessErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::InvalidRequest, message)
    }

    pub fn health_check(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::HealthCheck, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::Authentication, message)
    }

    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::NotAuthenticated, message)
    }

    /// A 2xx response whose body breaks the endpoint contract.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::Protocol, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::Transport, message)
    }
}

impl Display for HarnessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for HarnessError {}

impl From<TransportError> for HarnessError {
    fn from(value: TransportError) -> Self {
        HarnessError::transport(value.to_string())
    }
}
