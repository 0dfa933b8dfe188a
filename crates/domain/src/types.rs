//! Common data types used throughout the booking core

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a room, as assigned by the room service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a fixed daily time slot (e.g. `"morning"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed, named daily time window used as the atomic booking unit.
///
/// Slots are immutable configuration, not persisted entities. Windows are
/// half-open: a slot covers `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Lifecycle state of a reservation.
///
/// Cancellation is a soft delete; cancelled reservations may still appear in
/// upstream lists and must be ignored by availability computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

/// A booking of a room for a time window on a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub status: ReservationStatus,
    pub owner_id: String,
    pub purpose: Option<String>,
}

impl Reservation {
    /// Whether this reservation participates in availability computation.
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Admin-imposed block on a room.
///
/// While present, the room is unavailable for every slot regardless of
/// reservations. Set and cleared only by admin action upstream; read-only
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomBlock {
    pub reason: String,
    pub blocked_by: String,
    pub blocked_at: DateTime<Utc>,
}

/// Room as seen by the booking core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub blocked: Option<RoomBlock>,
}

/// Derived availability of a single slot. Computed fresh on every query,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot_id: SlotId,
    pub available: bool,
}

/// Derived "occupied right now" marker for a slot.
///
/// Kept separate from [`SlotAvailability`] so that rendering a dashboard at
/// different wall-clock times never changes the availability data used for
/// booking decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOccupancy {
    pub slot_id: SlotId,
    pub occupied_now: bool,
}

/// Aggregate availability status of a room over one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// All slots available.
    Free,
    /// Some slots available.
    Partial,
    /// No slots available.
    Full,
}

/// Derived aggregate over all slots of a room for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDayAvailability {
    pub status: DayStatus,
    pub per_slot: Vec<SlotAvailability>,
    /// Explanation shown to users when the day is fully unavailable because
    /// of a room block.
    pub message: Option<String>,
}

impl RoomDayAvailability {
    /// Look up the availability flag for one slot, if it is part of this
    /// result.
    pub fn slot_available(&self, slot_id: &SlotId) -> Option<bool> {
        self.per_slot.iter().find(|s| &s.slot_id == slot_id).map(|s| s.available)
    }
}

/// A booking request as entered by the user: room, date and slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub slot_id: SlotId,
    pub purpose: Option<String>,
}

/// Payload submitted to the booking create/update endpoint. The slot has
/// been resolved to its concrete time window by this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub purpose: Option<String>,
}

/// A confirmed booking as returned by the booking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub owner_id: String,
    pub purpose: Option<String>,
}
