//! # Roomly Domain
//!
//! Business domain types and models for the Roomly booking core.
//!
//! This crate contains:
//! - Domain data types (TimeSlot, Reservation, RoomBlock, availability views)
//! - Domain error types and Result definitions
//! - Configuration structures (slot catalog, API/retry settings)
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Roomly crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::{ApiConfig, Config, RetrySettings, SlotCatalog};
pub use errors::{BookingError, Result};
pub use types::{
    Booking, BookingPayload, BookingRequest, DayStatus, Reservation, ReservationStatus, Room,
    RoomBlock, RoomDayAvailability, RoomId, SlotAvailability, SlotId, SlotOccupancy, TimeSlot,
};
