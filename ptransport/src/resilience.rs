//! Retry/backoff policy, injectable sleeping, and operational hook contracts.

use std::future::Future;
use std::time::Duration;

use pcommon::EndpointLabel;

use crate::{TransportError, TransportFuture};

/// Retries after the first attempt when nothing else is configured.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_BUDGET + 1,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// `retries` extra attempts on top of the first one.
    pub fn from_retry_budget(retries: u32) -> Self {
        Self::new(retries.saturating_add(1))
    }

    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn retry_budget(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    pub fn should_retry(&self, attempt: u32, error: &TransportError) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }

    /// Delay before attempt `attempt + 1`: 2s, 4s, 8s, ... with the defaults.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = (attempt.saturating_sub(1)) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep<'a>(&'a self, delay: Duration) -> TransportFuture<'a, ()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, delay: Duration) -> TransportFuture<'a, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

pub trait TransportOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _endpoint: &EndpointLabel, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _endpoint: &EndpointLabel,
        _attempt: u32,
        _delay: Duration,
        _error: &TransportError,
    ) {
    }

    fn on_success(&self, _endpoint: &EndpointLabel, _attempts: u32, _status: u16) {}

    fn on_failure(&self, _endpoint: &EndpointLabel, _attempts: u32, _error: &TransportError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl TransportOperationHooks for NoopOperationHooks {}

/// Anything a completed call can report its HTTP status through.
pub trait HasStatus {
    fn status(&self) -> u16;
}

impl HasStatus for crate::ApiResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

impl HasStatus for crate::ApiEventStream<'_> {
    fn status(&self) -> u16 {
        self.status
    }
}

pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    endpoint: &EndpointLabel,
    policy: &RetryPolicy,
    hooks: &dyn TransportOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, TransportError>
where
    T: HasStatus,
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, TransportError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(endpoint, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(endpoint, attempt, value.status());
                return Ok(value);
            }
            Err(error) => {
                if policy.should_retry(attempt, &error) {
                    let delay = policy.backoff_for_attempt(attempt);
                    hooks.on_retry_scheduled(endpoint, attempt, delay, &error);
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                hooks.on_failure(endpoint, attempt, &error);
                return Err(error);
            }
        }
    }
}
