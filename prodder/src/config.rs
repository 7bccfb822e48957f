//! Run configuration resolved once at startup.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use prodder::config::{ProbeConfig, RunMode, ScenarioName};
//! use prodder::util::Credentials;
//!
//! let config = ProbeConfig::new("http://localhost:3000", Credentials::new("a@example.com", "pw"))
//!     .with_timeout(Duration::from_secs(3))
//!     .with_mode(RunMode::Single(ScenarioName::Sessions));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.executor_config().retry_policy.retry_budget(), 3);
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use clap::ValueEnum;
use pharness::{DEFAULT_STREAM_WINDOW, ExecutorConfig, HarnessError};
use ptransport::{ApiKeyHeader, DEFAULT_RETRY_BUDGET, RetryPolicy};

use crate::util::Credentials;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Scenarios addressable from `--single-test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ScenarioName {
    Health,
    Login,
    Validate,
    Profile,
    Diagnostics,
    Chat,
    Sessions,
    Knowledge,
    Refresh,
    Logout,
    Invalidation,
}

impl ScenarioName {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioName::Health => "health",
            ScenarioName::Login => "login",
            ScenarioName::Validate => "validate",
            ScenarioName::Profile => "profile",
            ScenarioName::Diagnostics => "diagnostics",
            ScenarioName::Chat => "chat",
            ScenarioName::Sessions => "sessions",
            ScenarioName::Knowledge => "knowledge",
            ScenarioName::Refresh => "refresh",
            ScenarioName::Logout => "logout",
            ScenarioName::Invalidation => "invalidation",
        }
    }
}

impl Display for ScenarioName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Full,
    /// Health check and login only.
    LoginOnly,
    /// Health check, login, then the named scenario.
    Single(ScenarioName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_budget: u32,
    pub debug: bool,
    pub api_key: Option<ApiKeyHeader>,
    pub credentials: Credentials,
    pub mode: RunMode,
    pub stream_window: Duration,
    pub include_diagnostics: bool,
}

impl ProbeConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry_budget: DEFAULT_RETRY_BUDGET,
            debug: false,
            api_key: None,
            credentials,
            mode: RunMode::Full,
            stream_window: DEFAULT_STREAM_WINDOW,
            include_diagnostics: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_api_key(mut self, api_key: ApiKeyHeader) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stream_window(mut self, stream_window: Duration) -> Self {
        self.stream_window = stream_window;
        self
    }

    pub fn with_diagnostics(mut self, include_diagnostics: bool) -> Self {
        self.include_diagnostics = include_diagnostics;
        self
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.base_url.trim().is_empty() {
            return Err(HarnessError::invalid_request("base url must not be empty"));
        }
        if self.stream_window.is_zero() {
            return Err(HarnessError::invalid_request(
                "stream window must be greater than zero",
            ));
        }
        if self.credentials.login.trim().is_empty() {
            return Err(HarnessError::invalid_request("login must not be empty"));
        }
        self.executor_config().validate()
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        let mut config = ExecutorConfig::new(self.base_url.trim())
            .with_timeout(self.timeout)
            .with_debug(self.debug)
            .with_retry_policy(RetryPolicy::from_retry_budget(self.retry_budget));
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        config
    }
}
