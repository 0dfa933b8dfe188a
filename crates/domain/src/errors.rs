//! Error types used throughout the booking core

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SlotId;

/// Failure modes of a booking attempt.
///
/// Local precondition failures (`PastDate`, `UnknownSlot`,
/// `AlreadyInProgress`) mean the user's own input is invalid and are never
/// retried. `Conflict` is an authoritative server rejection ("someone else
/// took this slot"); it is never conflated with a precondition failure and
/// never retried. `Transient` is surfaced only after retries are exhausted
/// and carries the attempt count for retry-progress display.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum BookingError {
    #[error("The requested slot has already started or the date is in the past")]
    PastDate,

    #[error("Unknown time slot: {slot_id}")]
    UnknownSlot { slot_id: SlotId },

    #[error("A booking attempt for this room, date and slot is already in progress")]
    AlreadyInProgress,

    #[error("Slot is not available: {message}")]
    SlotUnavailable { message: String },

    #[error("Booking conflict: {message}")]
    Conflict { message: String },

    #[error("Transient failure after {attempts} attempt(s): {message}")]
    Transient { kind: String, attempts: u32, message: String },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Error: {message}")]
    Generic { message: String },
}

impl BookingError {
    /// Whether this failure came from a local precondition check, before any
    /// network call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BookingError::PastDate
                | BookingError::UnknownSlot { .. }
                | BookingError::AlreadyInProgress
        )
    }
}

/// Result type alias for booking-core operations
pub type Result<T> = std::result::Result<T, BookingError>;
