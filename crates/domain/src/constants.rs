//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! booking core.

// Retry policy
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF_UNIT_MS: u64 = 1000;

// HTTP client defaults
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

// Built-in slot table (used when no slot configuration is supplied)
pub const SLOT_MORNING_ID: &str = "morning";
pub const SLOT_AFTERNOON_ID: &str = "afternoon";

// Upstream date contract: reservations are matched on exact local date
// strings, never timezone-shifted.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
