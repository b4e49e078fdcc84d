use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Timelike};
use pretty_assertions::assert_eq;
use slotbook_core::calendar::LocalClock;
use slotbook_core::coordinator::ReservationCoordinator;
use slotbook_core::errors::{BookingError, BookingResult};
use slotbook_core::generator::SlotGenerator;
use slotbook_core::memory::MemoryStore;
use slotbook_core::models::{
    Contact, DayOfWeek, NewAvailabilityRule, NewReservation, NewSlot, Period, ReserveOutcome,
    Slot, SlotFilter, SlotInsert, UpdateAvailabilityRule,
};
use slotbook_core::notification::{BookingNotification, NotificationFormatter, Notifier};
use slotbook_core::query::SlotQueryService;
use slotbook_core::repository::SlotRepository;
use slotbook_core::rules::RuleService;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Forwards every notification to a channel so tests can await delivery.
struct ChannelNotifier(mpsc::UnboundedSender<BookingNotification>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: &BookingNotification) -> BookingResult<()> {
        self.0
            .send(notification.clone())
            .map_err(|e| BookingError::Notification(e.to_string()))
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: &BookingNotification) -> BookingResult<()> {
        Err(BookingError::Notification("mail server down".to_string()))
    }
}

/// Slot reads that always report the slot as open, as a reader that raced
/// another booking would see it. Writes go to the real store.
struct StaleSlots(Arc<MemoryStore>);

#[async_trait]
impl SlotRepository for StaleSlots {
    async fn insert_slot(&self, input: &NewSlot) -> eyre::Result<SlotInsert> {
        self.0.insert_slot(input).await
    }

    async fn get_slot(&self, id: Uuid) -> eyre::Result<Option<Slot>> {
        Ok(self.0.get_slot(id).await?.map(|slot| Slot {
            available: true,
            reservation_id: None,
            ..slot
        }))
    }

    async fn list_slots_between(
        &self,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> eyre::Result<Vec<Slot>> {
        self.0.list_slots_between(from, to).await
    }

    async fn reserve_slot(
        &self,
        slot_id: Uuid,
        input: &NewReservation,
    ) -> eyre::Result<ReserveOutcome> {
        self.0.reserve_slot(slot_id, input).await
    }
}

struct Booking {
    store: Arc<MemoryStore>,
    clock: LocalClock,
    rules: RuleService,
    generator: SlotGenerator,
    query: SlotQueryService,
    coordinator: ReservationCoordinator,
    notifications: mpsc::UnboundedReceiver<BookingNotification>,
}

fn booking_with(store: MemoryStore) -> Booking {
    let store = Arc::new(store);
    let clock = LocalClock::from_offset_minutes(-180).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let formatter = NotificationFormatter::new(
        clock,
        chrono::Locale::pt_BR,
        "%-d de %B de %Y",
        "hrs",
    );

    Booking {
        rules: RuleService::new(store.clone()),
        generator: SlotGenerator::new(store.clone(), store.clone(), clock),
        query: SlotQueryService::new(store.clone(), store.clone(), clock),
        coordinator: ReservationCoordinator::new(
            store.clone(),
            store.clone(),
            Arc::new(ChannelNotifier(tx)),
            formatter,
        )
        .with_directory(store.clone()),
        store,
        clock,
        notifications: rx,
    }
}

fn booking() -> Booking {
    booking_with(MemoryStore::new())
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn rule(day: DayOfWeek, start: NaiveTime, end: NaiveTime, step: i32) -> NewAvailabilityRule {
    NewAvailabilityRule {
        day_of_week: day,
        period: Period::of(start),
        start_time: start,
        end_time: end,
        step_minutes: step,
        active: true,
    }
}

fn local_times(booking: &Booking, slots: &[slotbook_core::models::Slot]) -> Vec<NaiveTime> {
    slots
        .iter()
        .map(|slot| booking.clock.to_local(slot.date_time).time())
        .collect()
}

#[tokio::test]
async fn test_window_end_is_exclusive() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();

    let day = booking.generator.generate_for_date(monday()).await.unwrap();

    assert_eq!(local_times(&booking, &day.slots()), vec![hm(8, 0), hm(8, 30)]);
    assert!(day.slots().iter().all(|slot| slot.available));
}

#[tokio::test]
async fn test_short_trailing_stride_is_dropped() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(8, 45), 30))
        .await
        .unwrap();

    let day = booking.generator.generate_for_date(monday()).await.unwrap();

    assert_eq!(local_times(&booking, &day.slots()), vec![hm(8, 0)]);
}

#[tokio::test]
async fn test_regeneration_is_idempotent() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(10, 0), 30))
        .await
        .unwrap();

    let first = booking.generator.generate_for_date(monday()).await.unwrap();
    let second = booking.generator.generate_for_date(monday()).await.unwrap();

    assert_eq!(first.created.len(), 4);
    assert!(second.created.is_empty());
    assert_eq!(second.existing.len(), 4);
    assert_eq!(first.slots(), second.slots());
    assert_eq!(booking.store.slot_count().unwrap(), 4);
}

#[tokio::test]
async fn test_concurrent_generation_of_one_date() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(12, 0), 15))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        booking.generator.generate_for_date(monday()),
        booking.generator.generate_for_date(monday())
    );

    let created = a.unwrap().created.len() + b.unwrap().created.len();
    assert_eq!(created, 16);
    assert_eq!(booking.store.slot_count().unwrap(), 16);
}

#[tokio::test]
async fn test_concurrent_reservations_have_one_winner() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(8, 30), 30))
        .await
        .unwrap();
    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    let slot_id = day.created[0].id;

    let (first, second) = tokio::join!(
        booking.coordinator.reserve(slot_id, "user-1", "Alice"),
        booking.coordinator.reserve(slot_id, "user-2", "Bruno")
    );

    let outcomes = [first, second];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    let losers: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(losers.len(), 1);
    assert!(matches!(losers[0], BookingError::SlotUnavailable(id) if *id == slot_id));

    let slots = booking.query.list_by_date(monday()).await.unwrap();
    assert!(!slots[0].available);
    assert_eq!(slots[0].reservation_id, Some(winners[0].id));
    assert_eq!(booking.store.reservation_count().unwrap(), 1);
}

#[tokio::test]
async fn test_many_concurrent_reservations_have_one_winner() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(14, 0), hm(15, 0), 60))
        .await
        .unwrap();
    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    let slot_id = day.created[0].id;

    let mut handles = Vec::new();
    for n in 0..16 {
        let coordinator = booking.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .reserve(slot_id, &format!("user-{n}"), &format!("Patient {n}"))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::SlotUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(booking.store.reservation_count().unwrap(), 1);
}

#[tokio::test]
async fn test_store_rejects_second_reservation_of_a_slot() {
    let booking = booking();
    let rule = booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(8, 30), 30))
        .await
        .unwrap();
    let slot = booking
        .store
        .insert_slot(&NewSlot {
            date_time: booking.clock.at(monday(), hm(8, 0)).unwrap(),
            source_rule_id: rule.id,
        })
        .await
        .unwrap()
        .into_slot();

    let first = booking
        .store
        .reserve_slot(slot.id, &NewReservation::confirmed(slot.date_time, "user-1", "Alice"))
        .await
        .unwrap();
    let second = booking
        .store
        .reserve_slot(slot.id, &NewReservation::confirmed(slot.date_time, "user-2", "Bruno"))
        .await
        .unwrap();

    let ReserveOutcome::Reserved(winner) = first else {
        panic!("first reservation should succeed");
    };
    assert!(matches!(second, ReserveOutcome::SlotUnavailable));
    assert_eq!(booking.store.reservation_count().unwrap(), 1);

    let stored = booking.store.get_slot(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.reservation_id, Some(winner.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_race_past_stale_read_has_one_winner() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(10, 0), hm(11, 0), 60))
        .await
        .unwrap();
    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    let slot_id = day.created[0].id;

    let coordinator = ReservationCoordinator::new(
        Arc::new(StaleSlots(booking.store.clone())),
        booking.store.clone(),
        Arc::new(FailingNotifier),
        NotificationFormatter::default(),
    );

    let mut handles = Vec::new();
    for n in 0..16 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .reserve(slot_id, &format!("user-{n}"), &format!("Patient {n}"))
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::SlotUnavailable(id)) => {
                assert_eq!(id, slot_id);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(booking.store.reservation_count().unwrap(), 1);
}

#[tokio::test]
async fn test_available_weekdays_follow_active_rules() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(14, 0), hm(15, 0), 30))
        .await
        .unwrap();
    let wednesday = booking
        .rules
        .create(rule(DayOfWeek::WEDNESDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();
    booking
        .rules
        .create(NewAvailabilityRule {
            active: false,
            ..rule(DayOfWeek::FRIDAY, hm(8, 0), hm(9, 0), 30)
        })
        .await
        .unwrap();

    assert_eq!(
        booking.query.list_available_weekdays().await.unwrap(),
        vec![DayOfWeek::MONDAY, DayOfWeek::WEDNESDAY]
    );

    booking
        .rules
        .update(
            wednesday.id,
            UpdateAvailabilityRule {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        booking.rules.list_available_weekdays().await.unwrap(),
        vec![DayOfWeek::MONDAY]
    );
}

#[tokio::test]
async fn test_stored_instant_reads_back_as_local_hour() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(8, 30), 30))
        .await
        .unwrap();
    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    let stored = day.created[0].date_time;

    let encoded = booking.clock.encode(stored);
    let legacy = booking.clock.to_local(stored).format("%Y-%m-%dT%H:%M:%S").to_string();

    assert_eq!(encoded, "2026-10-19T11:00:00Z");
    assert_eq!(legacy, "2026-10-19T08:00:00");
    for raw in [encoded, legacy] {
        let decoded = booking.clock.to_local(booking.clock.decode(&raw).unwrap());
        assert_eq!((decoded.hour(), decoded.minute()), (8, 0));
    }
}

#[tokio::test]
async fn test_edited_rule_leaves_generated_slots_alone() {
    let booking = booking();
    let created = booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();
    booking.generator.generate_for_date(monday()).await.unwrap();

    booking.rules.delete(created.id).await.unwrap();
    booking.rules.delete(created.id).await.unwrap();

    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    assert!(day.slots().is_empty());
    assert_eq!(booking.query.list_by_date(monday()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_monday_booking_scenario() {
    let mut booking = booking_with(MemoryStore::new().with_contact(
        "user-42",
        Contact {
            name: "Alice Souza".to_string(),
            email: Some("alice@example.com".to_string()),
        },
    ));
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(10, 0), 60))
        .await
        .unwrap();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(14, 0), hm(16, 0), 60))
        .await
        .unwrap();

    let day = booking.generator.generate_for_date(monday()).await.unwrap();
    assert_eq!(
        local_times(&booking, &day.slots()),
        vec![hm(8, 0), hm(9, 0), hm(14, 0), hm(15, 0)]
    );

    let morning = booking
        .query
        .list_local(
            monday(),
            SlotFilter {
                period: Some(Period::Morning),
                available_only: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(morning.len(), 2);
    let eight = &morning[0];
    assert_eq!(eight.local_time, hm(8, 0));

    let reservation = booking
        .coordinator
        .reserve(eight.slot.id, "user-42", "Alice")
        .await
        .unwrap();
    assert_eq!(reservation.slot_date_time, eight.slot.date_time);

    let notification = tokio::time::timeout(Duration::from_secs(5), booking.notifications.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        notification,
        BookingNotification {
            name: "Alice Souza".to_string(),
            date: "19 de outubro de 2026".to_string(),
            time: "08:00hrs".to_string(),
            email: "alice@example.com".to_string(),
        }
    );

    let remaining = booking
        .query
        .list_local(
            monday(),
            SlotFilter {
                period: Some(Period::Morning),
                available_only: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].local_time, hm(9, 0));

    let again = booking
        .coordinator
        .reserve(eight.slot.id, "user-7", "Bruno")
        .await
        .unwrap_err();
    assert!(matches!(again, BookingError::SlotUnavailable(_)));

    let mine = booking.coordinator.reservations_for_user("user-42").await.unwrap();
    assert_eq!(mine, vec![reservation.clone()]);
    assert_eq!(
        booking.coordinator.get_reservation(reservation.id).await.unwrap(),
        reservation
    );
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_reservation() {
    let store = Arc::new(MemoryStore::new());
    let clock = LocalClock::utc();
    let rules = RuleService::new(store.clone());
    let generator = SlotGenerator::new(store.clone(), store.clone(), clock);
    let coordinator = ReservationCoordinator::new(
        store.clone(),
        store.clone(),
        Arc::new(FailingNotifier),
        NotificationFormatter::default(),
    );

    rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(9, 0), 60))
        .await
        .unwrap();
    let day = generator.generate_for_date(monday()).await.unwrap();

    let reservation = coordinator
        .reserve(day.created[0].id, "user-1", "Alice")
        .await
        .unwrap();
    assert_eq!(reservation.user_name, "Alice");
}

#[tokio::test]
async fn test_unknown_slot_is_not_found() {
    let booking = booking();
    let err = booking
        .coordinator
        .reserve(Uuid::new_v4(), "user-1", "Alice")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
    assert_eq!(booking.store.reservation_count().unwrap(), 0);
}

#[tokio::test]
async fn test_batch_generation_counts_days_with_slots() {
    let booking = booking();
    booking
        .rules
        .create(rule(DayOfWeek::MONDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();
    booking
        .rules
        .create(rule(DayOfWeek::WEDNESDAY, hm(8, 0), hm(9, 0), 30))
        .await
        .unwrap();

    // Sunday 2026-10-18 through Saturday 2026-10-24
    let start = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let summary = booking.generator.generate_range(start, 7).await;

    assert_eq!(summary.days_requested, 7);
    assert_eq!(summary.days_with_slots, 2);
    assert_eq!(summary.total_slots, 4);
    assert!(summary.failed_days.is_empty());

    let rerun = booking.generator.generate_range(start, 7).await;
    assert_eq!(rerun.total_slots, 0);
    assert_eq!(rerun.existing_slots, 4);
    assert_eq!(rerun.days_with_slots, 2);
}

#[tokio::test]
async fn test_next_day_for_weekday_includes_today() {
    let booking = booking();
    let today = booking.clock.today();
    let weekday = slotbook_core::calendar::day_of_week(today);
    booking
        .rules
        .create(rule(weekday, hm(8, 0), hm(9, 0), 60))
        .await
        .unwrap();
    booking.generator.generate_for_date(today).await.unwrap();

    let schedule = booking.query.next_day_for_weekday(weekday).await.unwrap();

    assert_eq!(schedule.date, today);
    assert_eq!(schedule.slots.len(), 1);
}
