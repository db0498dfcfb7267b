//! Concurrent reservation scenarios against the in-memory backend.
#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use slot_booking::domain::{EventId, EventWithSlots, NewEvent, NewSlot, SlotId};
use slot_booking::error::BookingError;
use slot_booking::service::{BookingService, QueryService};
use slot_booking::storage::Storage;
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tokio_test::{assert_err, assert_ok};

struct Harness {
    storage: Storage,
    booking: Arc<BookingService>,
    query: QueryService,
}

fn harness() -> Harness {
    let storage = Storage::in_memory();
    let booking = Arc::new(BookingService::new(
        Arc::clone(&storage.catalog),
        Arc::clone(&storage.ledger),
    ));
    let query = QueryService::new(Arc::clone(&storage.catalog), Arc::clone(&storage.ledger));
    Harness {
        storage,
        booking,
        query,
    }
}

async fn publish(h: &Harness, capacities: &[i64]) -> EventWithSlots {
    let start = Utc::now() + Duration::days(7);
    let slots = capacities
        .iter()
        .zip(0i64..)
        .map(|(&max_bookings, offset)| NewSlot {
            time: start + Duration::hours(offset),
            max_bookings,
        })
        .collect();
    assert_ok!(
        h.storage
            .catalog
            .create_event(NewEvent {
                title: "Concurrency test".to_string(),
                description: String::new(),
                slots,
            })
            .await
    )
}

/// Fires one reservation per `(slot, email)` pair at the same instant and
/// returns each outcome next to its e-mail address.
async fn race(
    h: &Harness,
    event_id: EventId,
    attempts: Vec<(SlotId, String)>,
) -> Vec<(String, Result<SlotId, BookingError>)> {
    let barrier = Arc::new(Barrier::new(attempts.len()));
    let mut tasks = JoinSet::new();
    for (slot_id, email) in attempts {
        let service = Arc::clone(&h.booking);
        let barrier = Arc::clone(&barrier);
        tasks.spawn(async move {
            barrier.wait().await;
            let outcome = service
                .book(event_id, slot_id, "Racer", &email)
                .await
                .map(|booking| booking.slot_id);
            (email, outcome)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let Ok(outcome) = joined else {
            panic!("reservation task panicked");
        };
        outcomes.push(outcome);
    }
    outcomes
}

fn successes(outcomes: &[(String, Result<SlotId, BookingError>)]) -> usize {
    outcomes.iter().filter(|(_, r)| r.is_ok()).count()
}

fn full_rejections(outcomes: &[(String, Result<SlotId, BookingError>)]) -> usize {
    outcomes
        .iter()
        .filter(|(_, r)| matches!(r, Err(BookingError::SlotFull(_))))
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_place_goes_to_exactly_one_of_two_racers() {
    let h = harness();
    let event = publish(&h, &[1]).await;
    let slot_id = event.slots[0].id;

    let outcomes = race(
        &h,
        event.event.id,
        vec![(slot_id, "a@x.com".to_string()), (slot_id, "b@x.com".to_string())],
    )
    .await;

    assert_eq!(successes(&outcomes), 1);
    assert_eq!(full_rejections(&outcomes), 1);
    assert_eq!(h.storage.ledger.count_bookings(slot_id).await.ok(), Some(1));
}

#[tokio::test]
async fn repeated_booking_is_rejected_as_duplicate() {
    let h = harness();
    let event = publish(&h, &[3]).await;
    let slot_id = event.slots[0].id;

    assert_ok!(h.booking.book(event.event.id, slot_id, "Ann", "a@x.com").await);
    let err = assert_err!(h.booking.book(event.event.id, slot_id, "Ann", "a@x.com").await);
    assert!(matches!(err, BookingError::DuplicateBooking { .. }));
    assert_eq!(h.storage.ledger.count_bookings(slot_id).await.ok(), Some(1));
}

#[tokio::test]
async fn unknown_slot_of_event_is_not_found() {
    let h = harness();
    let event = publish(&h, &[2]).await;

    let err = assert_err!(
        h.booking
            .book(event.event.id, SlotId::new(), "Ann", "a@x.com")
            .await
    );
    assert!(matches!(err, BookingError::SlotNotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_across_slots_all_fit() {
    let h = harness();
    let event = publish(&h, &[2, 2, 2]).await;

    let attempts = (0..6)
        .map(|i| (event.slots[i % 3].id, format!("user{i}@x.com")))
        .collect();
    let outcomes = race(&h, event.event.id, attempts).await;

    assert_eq!(successes(&outcomes), 6);
    for slot in &event.slots {
        assert_eq!(h.storage.ledger.count_bookings(slot.id).await.ok(), Some(2));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn oversubscribed_slot_accepts_capacity_then_rejects() {
    let h = harness();
    let event = publish(&h, &[2]).await;
    let slot_id = event.slots[0].id;

    let attempts = (0..5)
        .map(|i| (slot_id, format!("user{i}@x.com")))
        .collect();
    let outcomes = race(&h, event.event.id, attempts).await;

    assert_eq!(successes(&outcomes), 2);
    assert_eq!(full_rejections(&outcomes), 3);

    for (email, outcome) in &outcomes {
        let history = assert_ok!(h.query.bookings_by_email(email).await);
        if outcome.is_ok() {
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].slot_id, slot_id);
            assert_eq!(history[0].event_id, event.event.id);
        } else {
            assert!(history.is_empty());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn capacity_holds_for_any_oversubscription() {
    for (capacity, extra) in [(1_usize, 9_usize), (3, 5), (10, 30)] {
        let h = harness();
        let Ok(max_bookings) = i64::try_from(capacity) else {
            panic!("capacity fits in i64");
        };
        let event = publish(&h, &[max_bookings]).await;
        let slot_id = event.slots[0].id;

        let attempts = (0..capacity + extra)
            .map(|i| (slot_id, format!("racer{i}@x.com")))
            .collect();
        let outcomes = race(&h, event.event.id, attempts).await;

        assert_eq!(successes(&outcomes), capacity);
        assert_eq!(full_rejections(&outcomes), extra);
        let booked = assert_ok!(h.storage.ledger.list_bookings(slot_id).await);
        assert_eq!(booked.len(), capacity);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_email_racing_books_once() {
    let h = harness();
    let event = publish(&h, &[10]).await;
    let slot_id = event.slots[0].id;

    let attempts = (0..8).map(|_| (slot_id, "same@x.com".to_string())).collect();
    let outcomes = race(&h, event.event.id, attempts).await;

    assert_eq!(successes(&outcomes), 1);
    let duplicates = outcomes
        .iter()
        .filter(|(_, r)| matches!(r, Err(BookingError::DuplicateBooking { .. })))
        .count();
    assert_eq!(duplicates, 7);
    assert!(
        h.storage
            .ledger
            .find_booking(slot_id, "same@x.com")
            .await
            .ok()
            .flatten()
            .is_some()
    );
}

#[tokio::test]
async fn rejected_reservations_leave_no_trace() {
    let h = harness();
    let event = publish(&h, &[1]).await;
    let slot_id = event.slots[0].id;

    assert_ok!(h.booking.book(event.event.id, slot_id, "Ann", "a@x.com").await);
    assert_err!(h.booking.book(event.event.id, slot_id, "Bob", "b@x.com").await);
    assert_err!(h.booking.book(event.event.id, slot_id, "", "c@x.com").await);
    assert_err!(h.booking.book(EventId::new(), slot_id, "Dan", "d@x.com").await);

    let bookings = assert_ok!(h.storage.ledger.list_bookings(slot_id).await);
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].email, "a@x.com");
}
