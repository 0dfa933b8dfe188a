//! Resilience primitives for network-calling operations.

pub mod retry;

pub use retry::{
    LinearBackoff, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
