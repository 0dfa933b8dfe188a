//! Availability engine
//!
//! Pure computation over a room's reservations for one date and the fixed
//! slot table. The caller pre-filters reservations to the target room and
//! date; the engine itself discards anything not `Active`, since stale
//! cancelled bookings are a common source of false conflicts.
//!
//! The one overlap rule used everywhere: half-open intervals
//! `[a_start, a_end)` and `[b_start, b_end)` overlap iff
//! `a_start < b_end && b_start < a_end`. A reservation ending exactly when a
//! slot starts does not conflict with that slot.

use chrono::{NaiveDateTime, NaiveTime};

use roomly_domain::{
    DayStatus, Reservation, RoomBlock, RoomDayAvailability, SlotAvailability, SlotOccupancy,
    TimeSlot,
};

/// Half-open interval overlap.
fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

/// Compute per-slot availability and the aggregate day status.
///
/// A slot is available iff no active reservation overlaps its window and the
/// room carries no block. A room block short-circuits every slot to
/// unavailable regardless of reservations; in that case `message` carries
/// the block reason.
///
/// Idempotent: identical inputs always yield identical output. There is no
/// clock dependency here; "occupied right now" is the separate
/// [`compute_occupancy`].
pub fn compute_availability(
    slots: &[TimeSlot],
    reservations: &[Reservation],
    blocked: Option<&RoomBlock>,
) -> RoomDayAvailability {
    // Empty slot table: vacuously free.
    if slots.is_empty() {
        return RoomDayAvailability { status: DayStatus::Free, per_slot: Vec::new(), message: None };
    }

    if let Some(block) = blocked {
        let per_slot = slots
            .iter()
            .map(|slot| SlotAvailability { slot_id: slot.id.clone(), available: false })
            .collect();
        return RoomDayAvailability {
            status: DayStatus::Full,
            per_slot,
            message: Some(block.reason.clone()),
        };
    }

    let active: Vec<&Reservation> = reservations.iter().filter(|r| r.is_active()).collect();

    let per_slot: Vec<SlotAvailability> = slots
        .iter()
        .map(|slot| {
            let taken =
                active.iter().any(|r| overlaps(r.start, r.end, slot.start, slot.end));
            SlotAvailability { slot_id: slot.id.clone(), available: !taken }
        })
        .collect();

    let available_count = per_slot.iter().filter(|s| s.available).count();
    let status = if available_count == per_slot.len() {
        DayStatus::Free
    } else if available_count == 0 {
        DayStatus::Full
    } else {
        DayStatus::Partial
    };

    RoomDayAvailability { status, per_slot, message: None }
}

/// Compute the live "occupied now" marker per slot.
///
/// A slot is occupied right now iff the query date is today, the current
/// wall-clock time falls inside an active reservation's window, and that
/// reservation overlaps the slot. This is a presentation nuance for room
/// cards; it never feeds booking decisions and is deliberately kept apart
/// from [`compute_availability`].
///
/// `now` comes from the caller's injected clock, never read here.
pub fn compute_occupancy(
    slots: &[TimeSlot],
    reservations: &[Reservation],
    now: NaiveDateTime,
) -> Vec<SlotOccupancy> {
    let time = now.time();
    let today = now.date();

    slots
        .iter()
        .map(|slot| {
            let occupied_now = reservations.iter().any(|r| {
                r.is_active()
                    && r.date == today
                    && r.start <= time
                    && time < r.end
                    && overlaps(r.start, r.end, slot.start, slot.end)
            });
            SlotOccupancy { slot_id: slot.id.clone(), occupied_now }
        })
        .collect()
}
