//! Port interfaces for the booking collaborators
//!
//! These traits define the boundaries between the booking core and the
//! external services that hold the actual data: the room/reservation read
//! side and the booking create/update endpoint. Adapters live in
//! `roomly-infra`; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;

use roomly_domain::{Booking, BookingPayload, Reservation, Room, RoomId};

use crate::classify::ClassifiedError;

/// Read side: reservation lists and room state.
#[async_trait]
pub trait ReservationDirectory: Send + Sync {
    /// Fetch the reservations of a room on one date.
    ///
    /// Implementations must return only reservations whose date matches
    /// exactly (local `YYYY-MM-DD` equality, never timezone-shifted).
    /// Cancelled reservations may be included; the availability engine
    /// filters them out.
    async fn fetch_reservations(
        &self,
        room_id: &RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, ClassifiedError>;

    /// Fetch a room, including any admin block attached to it.
    async fn fetch_room(&self, room_id: &RoomId) -> Result<Room, ClassifiedError>;
}

/// Write side: the booking create/update endpoint.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// Submit a booking.
    ///
    /// The authoritative conflict check happens here: a response indicating
    /// the slot is no longer available must surface as a
    /// [`ClassifiedError`] of kind `Conflict` carrying the server's message.
    async fn submit_booking(&self, payload: BookingPayload) -> Result<Booking, ClassifiedError>;
}
