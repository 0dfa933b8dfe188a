//! Failure classification for network-calling operations
//!
//! Every failure reaching the booking core is folded into a small taxonomy
//! ([`FailureKind`]) that drives the retry decision: only `Network` and
//! `Server` are worth retrying; everything else cannot self-resolve and must
//! fail fast.
//!
//! Classification prefers structured signals (the HTTP status code, a typed
//! error code from the transport) and falls back to keyword inspection of
//! the message only for legacy untyped errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use roomly_common::resilience::{RetryDecision, RetryPolicy};

/// Category of a failed network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Missing/expired credentials or insufficient permissions.
    Auth,
    /// Transport-level failure: connection refused, DNS, timeout on the way
    /// out.
    Network,
    /// The server answered but is unhealthy (5xx, overloaded, timed out).
    Server,
    /// The server confirmed the slot was taken by someone else.
    Conflict,
    /// The server rejected the request payload.
    Validation,
    /// Anything that fits none of the above.
    Generic,
}

impl FailureKind {
    /// Whether a failure of this kind may resolve on its own if retried.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Network | FailureKind::Server)
    }

    /// Stable label for logging and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Auth => "auth",
            FailureKind::Network => "network",
            FailureKind::Server => "server",
            FailureKind::Conflict => "conflict",
            FailureKind::Validation => "validation",
            FailureKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure from a network call, classified for the retry policy.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status code when the failure came from an HTTP response.
    pub status: Option<u16>,
}

impl ClassifiedError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), status: None }
    }

    /// Classify from an HTTP status code (the preferred, structured path).
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => FailureKind::Auth,
            409 => FailureKind::Conflict,
            400 | 422 => FailureKind::Validation,
            408 | 429 => FailureKind::Server,
            s if s >= 500 => FailureKind::Server,
            _ => FailureKind::Generic,
        };
        Self { kind, message: message.into(), status: Some(status) }
    }

    /// Classify from a prose error message.
    ///
    /// Last-resort branch for untyped legacy errors; the keyword table
    /// mirrors the phrases the legacy booking service emits.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        let kind = if contains_any(&lowered, &["unauthorized", "forbidden", "token", "login"]) {
            FailureKind::Auth
        } else if contains_any(&lowered, &["no longer available", "already booked", "conflict"]) {
            FailureKind::Conflict
        } else if contains_any(&lowered, &["network", "connection", "unreachable", "timed out", "timeout"])
        {
            FailureKind::Network
        } else if contains_any(&lowered, &["server error", "internal error", "unavailable", "overloaded"])
        {
            FailureKind::Server
        } else if contains_any(&lowered, &["invalid", "validation", "required field", "must be"]) {
            FailureKind::Validation
        } else {
            FailureKind::Generic
        };

        Self { kind, message, status: None }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Server, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Conflict, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Retry policy over classified errors: retry transient kinds, stop on
/// everything else. A conflict is a correctness signal, not a transient
/// fault, so it always stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientOnly;

impl RetryPolicy<ClassifiedError> for TransientOnly {
    fn should_retry(&self, error: &ClassifiedError, _attempt: u32) -> RetryDecision {
        if error.is_retryable() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}
