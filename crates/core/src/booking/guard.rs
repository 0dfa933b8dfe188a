//! Conflict guard around the booking create/update path
//!
//! The guard never trusts client-side availability as authoritative; it only
//! uses it to short-circuit obviously doomed attempts. The authoritative
//! check is the submit call's response: a conflict there means someone else
//! won the race and must surface to the user, never be retried.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, warn};

use roomly_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use roomly_common::time::{Clock, SystemClock};
use roomly_domain::{
    Booking, BookingError, BookingPayload, BookingRequest, Result, RoomId, SlotCatalog, SlotId,
};

use crate::availability::compute_availability;
use crate::booking::ports::{BookingGateway, ReservationDirectory};
use crate::classify::{ClassifiedError, FailureKind, TransientOnly};

type InFlightKey = (RoomId, NaiveDate, SlotId);
type InFlightSet = Arc<Mutex<HashSet<InFlightKey>>>;

/// Guards the booking submission path against double-booking and duplicate
/// submissions.
///
/// The in-flight set is owned by the guard instance, so reusing the
/// abstraction in another host cannot leak attempts across sessions. One
/// guard instance corresponds to one UI session; exclusion across users is
/// the server's job.
pub struct BookingGuard {
    directory: Arc<dyn ReservationDirectory>,
    gateway: Arc<dyn BookingGateway>,
    clock: Arc<dyn Clock>,
    catalog: SlotCatalog,
    retry: RetryConfig,
    in_flight: InFlightSet,
}

impl BookingGuard {
    /// Create a guard with the system clock and default retry settings.
    pub fn new(
        directory: Arc<dyn ReservationDirectory>,
        gateway: Arc<dyn BookingGateway>,
        catalog: SlotCatalog,
    ) -> Self {
        Self {
            directory,
            gateway,
            clock: Arc::new(SystemClock),
            catalog,
            retry: RetryConfig::default(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Substitute the wall clock (tests use a mock clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the retry settings.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Attempt to book a slot.
    ///
    /// Precondition checks, the at-most-one-in-flight check and the
    /// submission happen strictly in sequence. The in-flight entry is held
    /// through an RAII guard, so dropping this future mid-retry (user closed
    /// the modal) still releases the tuple.
    pub async fn attempt_booking(&self, request: BookingRequest) -> Result<Booking> {
        let slot = self
            .catalog
            .get(&request.slot_id)
            .ok_or_else(|| BookingError::UnknownSlot { slot_id: request.slot_id.clone() })?
            .clone();

        // A slot whose start instant has already elapsed cannot be booked,
        // even if the calendar date is today.
        let now = self.clock.now();
        if request.date < now.date() || (request.date == now.date() && slot.start < now.time()) {
            return Err(BookingError::PastDate);
        }

        let key = (request.room_id.clone(), request.date, request.slot_id.clone());
        let _in_flight = InFlightEntry::acquire(&self.in_flight, key)
            .ok_or(BookingError::AlreadyInProgress)?;

        // Client-side revalidation against a fresh reservation list. This is
        // a UI optimization; the server remains authoritative.
        let room = self.fetch_with_retry(|| self.directory.fetch_room(&request.room_id)).await?;
        let reservations = self
            .fetch_with_retry(|| self.directory.fetch_reservations(&request.room_id, request.date))
            .await?;

        let availability =
            compute_availability(self.catalog.slots(), &reservations, room.blocked.as_ref());
        if availability.slot_available(&request.slot_id) == Some(false) {
            let message = availability.message.clone().unwrap_or_else(|| {
                format!("{} is already booked on {}", slot.label, request.date)
            });
            debug!(slot = %request.slot_id, %message, "booking short-circuited client-side");
            return Err(BookingError::SlotUnavailable { message });
        }

        let payload = BookingPayload {
            room_id: request.room_id.clone(),
            date: request.date,
            start: slot.start,
            end: slot.end,
            purpose: request.purpose.clone(),
        };

        let executor = RetryExecutor::new(self.retry, TransientOnly);
        match executor.execute(|| self.gateway.submit_booking(payload.clone())).await {
            Ok(booking) => {
                debug!(booking_id = %booking.id, "booking confirmed");
                Ok(booking)
            }
            Err(err) => {
                warn!(slot = %request.slot_id, date = %request.date, "booking failed: {err}");
                Err(map_failure(err))
            }
        }
    }

    /// Run a read call through the shared retry policy.
    async fn fetch_with_retry<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ClassifiedError>>,
    {
        let executor = RetryExecutor::new(self.retry, TransientOnly);
        executor.execute(operation).await.map_err(map_failure)
    }
}

/// Map an exhausted or non-retryable classified failure onto the booking
/// error taxonomy.
fn map_failure(err: RetryError<ClassifiedError>) -> BookingError {
    let attempts = err.attempts();
    let source = err.into_source();
    match source.kind {
        FailureKind::Conflict => BookingError::Conflict { message: source.message },
        FailureKind::Auth => BookingError::Auth { message: source.message },
        FailureKind::Validation => BookingError::Validation { message: source.message },
        FailureKind::Generic => BookingError::Generic { message: source.message },
        FailureKind::Network | FailureKind::Server => BookingError::Transient {
            kind: source.kind.as_str().to_string(),
            attempts,
            message: source.message,
        },
    }
}

/// RAII entry in the in-flight set; removal happens on drop, including when
/// the booking future is cancelled.
struct InFlightEntry {
    set: InFlightSet,
    key: InFlightKey,
}

impl InFlightEntry {
    fn acquire(set: &InFlightSet, key: InFlightKey) -> Option<Self> {
        let mut entries = set.lock();
        if !entries.insert(key.clone()) {
            return None;
        }
        drop(entries);
        Some(Self { set: Arc::clone(set), key })
    }
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::{NaiveDateTime, NaiveTime};
    use roomly_common::time::MockClock;
    use roomly_domain::{Reservation, ReservationStatus, Room, RoomBlock};
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;
    use async_trait::async_trait;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
    }

    fn moment(h: u32, m: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, 0).expect("valid time")
    }

    fn request(slot: &str) -> BookingRequest {
        BookingRequest {
            room_id: RoomId::new("r-1"),
            date: date(),
            slot_id: SlotId::new(slot),
            purpose: Some("standup".to_string()),
        }
    }

    fn booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            room_id: RoomId::new("r-1"),
            date: date(),
            start: time(14, 0),
            end: time(18, 0),
            owner_id: "user-1".to_string(),
            purpose: Some("standup".to_string()),
        }
    }

    fn reservation(start: NaiveTime, end: NaiveTime) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            room_id: RoomId::new("r-1"),
            date: date(),
            start,
            end,
            status: ReservationStatus::Active,
            owner_id: "user-2".to_string(),
            purpose: None,
        }
    }

    /// Directory fake serving a fixed room and reservation list.
    struct FakeDirectory {
        room: Room,
        reservations: Vec<Reservation>,
        calls: AtomicU32,
    }

    impl FakeDirectory {
        fn empty() -> Self {
            Self::with_reservations(Vec::new())
        }

        fn with_reservations(reservations: Vec<Reservation>) -> Self {
            Self {
                room: Room { id: RoomId::new("r-1"), name: "Aurora".to_string(), blocked: None },
                reservations,
                calls: AtomicU32::new(0),
            }
        }

        fn blocked(reason: &str) -> Self {
            let mut fake = Self::empty();
            fake.room.blocked = Some(RoomBlock {
                reason: reason.to_string(),
                blocked_by: "admin".to_string(),
                blocked_at: chrono::Utc::now(),
            });
            fake
        }
    }

    #[async_trait]
    impl ReservationDirectory for FakeDirectory {
        async fn fetch_reservations(
            &self,
            _room_id: &RoomId,
            _date: NaiveDate,
        ) -> std::result::Result<Vec<Reservation>, ClassifiedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reservations.clone())
        }

        async fn fetch_room(
            &self,
            _room_id: &RoomId,
        ) -> std::result::Result<Room, ClassifiedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.room.clone())
        }
    }

    /// Gateway fake driven by a script of responses.
    struct ScriptedGateway {
        script: Mutex<VecDeque<std::result::Result<Booking, ClassifiedError>>>,
        calls: AtomicU32,
    }

    impl ScriptedGateway {
        fn new(script: Vec<std::result::Result<Booking, ClassifiedError>>) -> Self {
            Self { script: Mutex::new(script.into_iter().collect()), calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BookingGateway for ScriptedGateway {
        async fn submit_booking(
            &self,
            _payload: BookingPayload,
        ) -> std::result::Result<Booking, ClassifiedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ClassifiedError::server("script exhausted")))
        }
    }

    /// Gateway fake that parks every submission until released.
    struct GatedGateway {
        entered: Notify,
        release: Notify,
        calls: AtomicU32,
    }

    impl GatedGateway {
        fn new() -> Self {
            Self { entered: Notify::new(), release: Notify::new(), calls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl BookingGateway for GatedGateway {
        async fn submit_booking(
            &self,
            _payload: BookingPayload,
        ) -> std::result::Result<Booking, ClassifiedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(booking())
        }
    }

    fn guard_with(
        directory: Arc<dyn ReservationDirectory>,
        gateway: Arc<dyn BookingGateway>,
    ) -> BookingGuard {
        BookingGuard::new(directory, gateway, SlotCatalog::default())
            .with_clock(Arc::new(MockClock::new(moment(8, 0))))
            .with_retry(RetryConfig::new(3, Duration::from_millis(1000)))
    }

    // ------------------------------------------------------------------
    // Preconditions
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn unknown_slot_is_rejected_before_any_call() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(booking())]));
        let guard = guard_with(directory.clone(), gateway.clone());

        let result = guard.attempt_booking(request("evening")).await;

        assert_eq!(
            result,
            Err(BookingError::UnknownSlot { slot_id: SlotId::new("evening") })
        );
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn past_date_is_rejected() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(booking())]));
        let guard = guard_with(directory, gateway.clone());

        let mut req = request("morning");
        req.date = NaiveDate::from_ymd_opt(2025, 3, 13).expect("valid date");
        assert_eq!(guard.attempt_booking(req).await, Err(BookingError::PastDate));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn slot_already_started_today_is_rejected() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(booking())]));
        // 10:00: the morning slot (09:00) has already started.
        let guard = guard_with(directory, gateway.clone())
            .with_clock(Arc::new(MockClock::new(moment(10, 0))));

        assert_eq!(
            guard.attempt_booking(request("morning")).await,
            Err(BookingError::PastDate)
        );
        // The afternoon slot has not started yet.
        assert!(guard.attempt_booking(request("afternoon")).await.is_ok());
    }

    // ------------------------------------------------------------------
    // Client-side revalidation
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn unavailable_slot_short_circuits_before_submit() {
        let directory =
            Arc::new(FakeDirectory::with_reservations(vec![reservation(time(9, 0), time(11, 0))]));
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(booking())]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("morning")).await;

        assert!(matches!(result, Err(BookingError::SlotUnavailable { .. })));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn blocked_room_short_circuits_with_reason() {
        let directory = Arc::new(FakeDirectory::blocked("floor closed for maintenance"));
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(booking())]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("afternoon")).await;

        assert_eq!(
            result,
            Err(BookingError::SlotUnavailable {
                message: "floor closed for maintenance".to_string()
            })
        );
        assert_eq!(gateway.calls(), 0);
    }

    // ------------------------------------------------------------------
    // At-most-one-in-flight
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn duplicate_in_flight_attempt_is_rejected_without_submit() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(GatedGateway::new());
        let guard = Arc::new(guard_with(directory, gateway.clone()));

        let first = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.attempt_booking(request("afternoon")).await })
        };
        gateway.entered.notified().await;

        // Identical tuple while the first attempt is outstanding.
        let second = guard.attempt_booking(request("afternoon")).await;
        assert_eq!(second, Err(BookingError::AlreadyInProgress));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        gateway.release.notify_one();
        assert!(first.await.expect("task completes").is_ok());

        // Once resolved, the tuple is free again.
        gateway.release.notify_one();
        let third = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.attempt_booking(request("afternoon")).await })
        };
        gateway.entered.notified().await;
        gateway.release.notify_one();
        assert!(third.await.expect("task completes").is_ok());
    }

    #[tokio::test]
    async fn cancelled_attempt_releases_the_in_flight_entry() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(GatedGateway::new());
        let guard = Arc::new(guard_with(directory, gateway.clone()));

        let first = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.attempt_booking(request("afternoon")).await })
        };
        gateway.entered.notified().await;

        // User closes the modal: the attempt future is dropped mid-flight.
        first.abort();
        assert!(first.await.is_err());

        // The tuple must be free; the retry timer from the aborted attempt
        // must not resurface either.
        let second = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.attempt_booking(request("afternoon")).await })
        };
        gateway.entered.notified().await;
        gateway.release.notify_one();
        assert!(second.await.expect("task completes").is_ok());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    // ------------------------------------------------------------------
    // Submission outcomes and retry behaviour
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_then_succeed() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(ClassifiedError::server("internal error")),
            Err(ClassifiedError::server("internal error")),
            Ok(booking()),
        ]));
        let guard = guard_with(directory, gateway.clone());

        let started = tokio::time::Instant::now();
        let result = guard.attempt_booking(request("afternoon")).await;

        assert!(result.is_ok());
        assert_eq!(gateway.calls(), 3);
        // Linear backoff: 1000ms after the first failure, 2000ms after the
        // second.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_attempt_count() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(ClassifiedError::network("connection refused")),
            Err(ClassifiedError::network("connection refused")),
            Err(ClassifiedError::network("connection refused")),
        ]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("afternoon")).await;

        assert_eq!(
            result,
            Err(BookingError::Transient {
                kind: "network".to_string(),
                attempts: 3,
                message: "connection refused".to_string(),
            })
        );
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(ClassifiedError::new(
            FailureKind::Auth,
            "session expired",
        ))]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("afternoon")).await;

        assert_eq!(result, Err(BookingError::Auth { message: "session expired".to_string() }));
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn server_conflict_is_surfaced_and_never_retried() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(ClassifiedError::conflict(
            "slot was taken a moment ago",
        ))]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("afternoon")).await;

        assert_eq!(
            result,
            Err(BookingError::Conflict { message: "slot was taken a moment ago".to_string() })
        );
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn validation_failure_fails_fast() {
        let directory = Arc::new(FakeDirectory::empty());
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(ClassifiedError::new(
            FailureKind::Validation,
            "purpose too long",
        ))]));
        let guard = guard_with(directory, gateway.clone());

        let result = guard.attempt_booking(request("afternoon")).await;

        assert_eq!(
            result,
            Err(BookingError::Validation { message: "purpose too long".to_string() })
        );
        assert_eq!(gateway.calls(), 1);
    }
}
