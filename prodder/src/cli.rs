//! Command-line surface.

use std::time::Duration;

use clap::Parser;
use ptransport::{ApiKeyHeader, DEFAULT_RETRY_BUDGET};

use crate::config::{DEFAULT_BASE_URL, ProbeConfig, RunMode, ScenarioName};
use crate::util::Credentials;

#[derive(Debug, Parser)]
#[command(name = "prodder")]
#[command(about = "Smoke-test the auth, session, and knowledge-base HTTP API", long_about = None)]
pub struct Cli {
    /// Base URL of the API under test
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "API_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,

    /// Retries after a connection error or timeout
    #[arg(long, env = "API_RETRY", default_value_t = DEFAULT_RETRY_BUDGET)]
    pub retry: u32,

    /// Run the health check and login only
    #[arg(long, conflicts_with = "single_test")]
    pub login_only: bool,

    /// Run one scenario after the health check and login
    #[arg(long, value_enum)]
    pub single_test: Option<ScenarioName>,

    /// Also exercise the diagnostic endpoints
    #[arg(long)]
    pub diagnostics: bool,

    /// Print request and response details for every call
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Static API key sent with every request
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Header carrying the API key
    #[arg(long, default_value = ApiKeyHeader::DEFAULT_HEADER_NAME)]
    pub api_key_header: String,

    /// Login to use instead of a generated test address
    #[arg(long)]
    pub login: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Seed for the generated test address
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seconds to read a server-sent-events stream before closing it
    #[arg(long, default_value_t = 5)]
    pub stream_window: u64,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        match (self.login_only, self.single_test) {
            (true, _) => RunMode::LoginOnly,
            (false, Some(name)) => RunMode::Single(name),
            (false, None) => RunMode::Full,
        }
    }

    pub fn into_config(self) -> ProbeConfig {
        let mode = self.mode();
        let credentials = Credentials::resolve(self.login, self.password, self.seed);
        let mut config = ProbeConfig::new(self.url, credentials)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_retry_budget(self.retry)
            .with_debug(self.debug)
            .with_mode(mode)
            .with_stream_window(Duration::from_secs(self.stream_window))
            .with_diagnostics(self.diagnostics);
        if let Some(key) = self.api_key.filter(|key| !key.is_empty()) {
            config = config.with_api_key(ApiKeyHeader::new(self.api_key_header, key));
        }
        config
    }
}
