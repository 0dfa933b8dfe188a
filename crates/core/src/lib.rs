//! # Roomly Core
//!
//! Business logic of the booking core:
//! - `availability`: pure per-slot availability and occupancy computation
//! - `booking`: the conflict guard around the create/update path, plus the
//!   port traits for the external booking/room services
//! - `classify`: failure classification feeding the shared retry policy
//!
//! Everything here is parameterized by the data it needs: no global state,
//! no events, no framework coupling.

pub mod availability;
pub mod booking;
pub mod classify;

pub use availability::{compute_availability, compute_occupancy};
pub use booking::{BookingGuard, BookingGateway, ReservationDirectory};
pub use classify::{ClassifiedError, FailureKind, TransientOnly};
