//! Booking submission path: ports and the conflict guard.

pub mod guard;
pub mod ports;

pub use guard::BookingGuard;
pub use ports::{BookingGateway, ReservationDirectory};
