//! Shared utilities for the Roomly crates.
//!
//! Two concerns live here, both free of domain knowledge:
//! - `resilience`: a generic retry executor with pluggable retry policies
//! - `time`: an injectable wall clock so time-dependent logic is testable
//!   without waiting for real time to pass

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod resilience;
pub mod time;

// Re-export commonly used types and traits for convenience
pub use resilience::{
    LinearBackoff, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
pub use time::{Clock, MockClock, SystemClock};
