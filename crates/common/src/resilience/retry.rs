//! Generic retry strategy with pluggable retry policies
//!
//! This module provides the retry mechanism used by every network-calling
//! operation in Roomly. The executor knows nothing about error semantics; a
//! [`RetryPolicy`] decides per error whether another attempt is worthwhile.
//! Backoff is linear: the delay before retry `n` is `n * unit`, with the
//! attempt counter starting at 1.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted; carries the last error seen.
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    AttemptsExhausted { attempts: u32, source: E },

    /// The operation failed with a non-retryable error on some attempt.
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { source: E },
}

impl<E> RetryError<E> {
    /// The underlying error, regardless of how the retry loop ended.
    pub fn into_source(self) -> E {
        match self {
            RetryError::AttemptsExhausted { source, .. } => source,
            RetryError::NonRetryable { source } => source,
        }
    }

    /// How many attempts were made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::AttemptsExhausted { attempts, .. } => *attempts,
            RetryError::NonRetryable { .. } => 1,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide whether the error from the given attempt (1-based) should be
    /// retried.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the backoff delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Linear backoff: the delay before retrying attempt `n` is `n * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub unit: Duration,
}

impl LinearBackoff {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt)
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self { unit: Duration::from_millis(1000) }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff applied between attempts.
    pub backoff: LinearBackoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff: LinearBackoff::default() }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff: LinearBackoff::new(backoff_unit) }
    }
}

/// The retry executor: runs an async operation until it succeeds, the policy
/// stops it, or attempts run out.
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    /// Execute an operation with retry logic.
    ///
    /// A non-retryable error fails fast on the attempt it occurs, without
    /// sleeping. A retryable error on the final attempt is reported as
    /// [`RetryError::AttemptsExhausted`] with the attempt count.
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;

        loop {
            debug!("Executing operation (attempt {}/{})", attempt, self.config.max_attempts);

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                        debug!("Retry policy determined not to retry: {:?}", error);
                        return Err(RetryError::NonRetryable { source: error });
                    }

                    if attempt >= self.config.max_attempts {
                        warn!(
                            "All retry attempts exhausted after {} tries, last error: {:?}",
                            attempt, error
                        );
                        return Err(RetryError::AttemptsExhausted { attempts: attempt, source: error });
                    }

                    let delay = self.config.backoff.delay_after(attempt);
                    warn!("Operation failed (attempt {}), retrying after {:?}", attempt, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Convenience function to create a retry executor and execute an operation
pub async fn retry_with_policy<F, Fut, T, E, P>(
    config: RetryConfig,
    policy: P,
    operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: RetryPolicy<E>,
    E: fmt::Debug,
{
    let executor = RetryExecutor::new(config, policy);
    executor.execute(operation).await
}
