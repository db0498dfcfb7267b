//! In-process storage with per-slot fine-grained locking.
//!
//! The catalog lives behind one [`tokio::sync::RwLock`]. Each slot carries
//! its own [`tokio::sync::Mutex`] over its booking list. `reserve` holds the
//! catalog read lock only long enough to clone the slot handle, then does
//! the duplicate check, capacity check, and insert under the slot mutex.
//!
//! # Concurrency
//!
//! - Reservations on the same slot are serialized by the slot mutex.
//! - Reservations on different slots run concurrently.
//! - Event creation takes the catalog write lock once, so an event and all
//!   of its slots become visible together.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{EventCatalog, ReservationLedger};
use crate::domain::{Booking, Event, EventId, EventWithSlots, NewBooking, NewEvent, Slot, SlotId};
use crate::error::BookingError;

/// A slot definition plus the bookings committed against it.
#[derive(Debug)]
struct SlotEntry {
    slot: Slot,
    bookings: Mutex<Vec<Booking>>,
}

impl SlotEntry {
    fn capacity(&self) -> usize {
        usize::try_from(self.slot.max_bookings).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Default)]
struct Catalog {
    order: Vec<EventId>,
    events: HashMap<EventId, Event>,
    event_slots: HashMap<EventId, Vec<SlotId>>,
    slots: HashMap<SlotId, Arc<SlotEntry>>,
}

/// Process-local implementation of [`EventCatalog`] and
/// [`ReservationLedger`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared handle of a slot, releasing the catalog lock
    /// before the caller touches the slot's bookings.
    async fn slot_entry(&self, slot_id: SlotId) -> Result<Arc<SlotEntry>, BookingError> {
        let catalog = self.catalog.read().await;
        catalog
            .slots
            .get(&slot_id)
            .map(Arc::clone)
            .ok_or(BookingError::SlotNotFound(slot_id))
    }

    async fn all_slot_entries(&self) -> Vec<Arc<SlotEntry>> {
        let catalog = self.catalog.read().await;
        catalog.slots.values().map(Arc::clone).collect()
    }
}

#[async_trait]
impl EventCatalog for MemoryStore {
    async fn create_event(&self, new_event: NewEvent) -> Result<EventWithSlots, BookingError> {
        let records = new_event.into_records()?;
        let event_id = records.event.id;

        let mut catalog = self.catalog.write().await;
        catalog.order.push(event_id);
        catalog.events.insert(event_id, records.event.clone());
        catalog
            .event_slots
            .insert(event_id, records.slots.iter().map(|slot| slot.id).collect());
        for slot in &records.slots {
            catalog.slots.insert(
                slot.id,
                Arc::new(SlotEntry {
                    slot: slot.clone(),
                    bookings: Mutex::new(Vec::new()),
                }),
            );
        }
        drop(catalog);

        tracing::info!(%event_id, slots = records.slots.len(), "event created");
        Ok(records)
    }

    async fn get_event(&self, event_id: EventId) -> Result<EventWithSlots, BookingError> {
        let catalog = self.catalog.read().await;
        let event = catalog
            .events
            .get(&event_id)
            .cloned()
            .ok_or(BookingError::EventNotFound(event_id))?;
        let slots = catalog
            .event_slots
            .get(&event_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| catalog.slots.get(id))
                    .map(|entry| entry.slot.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(EventWithSlots { event, slots })
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Slot, BookingError> {
        Ok(self.slot_entry(slot_id).await?.slot.clone())
    }

    async fn list_events(&self) -> Result<Vec<Event>, BookingError> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .order
            .iter()
            .filter_map(|id| catalog.events.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationLedger for MemoryStore {
    async fn reserve(&self, request: &NewBooking) -> Result<Booking, BookingError> {
        let entry = self.slot_entry(request.slot_id).await?;
        let mut bookings = entry.bookings.lock().await;

        if bookings.iter().any(|b| b.email == request.email) {
            return Err(BookingError::DuplicateBooking {
                slot_id: request.slot_id,
                email: request.email.clone(),
            });
        }
        if bookings.len() >= entry.capacity() {
            return Err(BookingError::SlotFull(request.slot_id));
        }

        let booking = Booking::confirm(request);
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn count_bookings(&self, slot_id: SlotId) -> Result<u32, BookingError> {
        let entry = self.slot_entry(slot_id).await?;
        let len = entry.bookings.lock().await.len();
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    async fn list_bookings(&self, slot_id: SlotId) -> Result<Vec<Booking>, BookingError> {
        let entry = self.slot_entry(slot_id).await?;
        let bookings = entry.bookings.lock().await.clone();
        Ok(bookings)
    }

    async fn find_booking(
        &self,
        slot_id: SlotId,
        email: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let Ok(entry) = self.slot_entry(slot_id).await else {
            return Ok(None);
        };
        let bookings = entry.bookings.lock().await;
        Ok(bookings.iter().find(|b| b.email == email).cloned())
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, BookingError> {
        let mut found = Vec::new();
        for entry in self.all_slot_entries().await {
            let bookings = entry.bookings.lock().await;
            found.extend(bookings.iter().filter(|b| b.email == email).cloned());
        }
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NewSlot;
    use chrono::{Duration, Utc};

    async fn store_with_slot(capacity: i64) -> (MemoryStore, EventWithSlots) {
        let store = MemoryStore::new();
        let Ok(created) = store
            .create_event(NewEvent {
                title: "Workshop".to_string(),
                description: String::new(),
                slots: vec![NewSlot {
                    time: Utc::now() + Duration::days(1),
                    max_bookings: capacity,
                }],
            })
            .await
        else {
            panic!("event creation failed");
        };
        (store, created)
    }

    fn first_slot(created: &EventWithSlots) -> SlotId {
        let Some(slot) = created.slots.first() else {
            panic!("event has no slots");
        };
        slot.id
    }

    fn request(slot_id: SlotId, email: &str) -> NewBooking {
        let Ok(request) = NewBooking::new(slot_id, "Guest", email) else {
            panic!("invalid request");
        };
        request
    }

    #[tokio::test]
    async fn create_and_get_event() {
        let (store, created) = store_with_slot(2).await;
        let Ok(fetched) = store.get_event(created.event.id).await else {
            panic!("event not found");
        };
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn invalid_event_is_not_stored() {
        let store = MemoryStore::new();
        let result = store
            .create_event(NewEvent {
                title: "Empty".to_string(),
                description: String::new(),
                slots: vec![],
            })
            .await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(store.list_events().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn list_events_keeps_creation_order() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for title in ["first", "second", "third"] {
            let Ok(created) = store
                .create_event(NewEvent {
                    title: title.to_string(),
                    description: String::new(),
                    slots: vec![NewSlot { time: Utc::now(), max_bookings: 1 }],
                })
                .await
            else {
                panic!("event creation failed");
            };
            ids.push(created.event.id);
        }
        let listed: Vec<_> = store
            .list_events()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_event(EventId::new()).await,
            Err(BookingError::EventNotFound(_))
        ));
        assert!(matches!(
            store.get_slot(SlotId::new()).await,
            Err(BookingError::SlotNotFound(_))
        ));
        assert!(matches!(
            store.reserve(&request(SlotId::new(), "a@x.com")).await,
            Err(BookingError::SlotNotFound(_))
        ));
    }

    #[tokio::test]
    async fn reserve_rejects_duplicate_email() {
        let (store, created) = store_with_slot(5).await;
        let slot_id = first_slot(&created);

        assert!(store.reserve(&request(slot_id, "a@x.com")).await.is_ok());
        let second = store.reserve(&request(slot_id, "A@X.com")).await;
        assert!(matches!(second, Err(BookingError::DuplicateBooking { .. })));
        assert_eq!(store.count_bookings(slot_id).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn reserve_rejects_when_full() {
        let (store, created) = store_with_slot(1).await;
        let slot_id = first_slot(&created);

        assert!(store.reserve(&request(slot_id, "a@x.com")).await.is_ok());
        let second = store.reserve(&request(slot_id, "b@x.com")).await;
        assert!(matches!(second, Err(BookingError::SlotFull(_))));
        assert_eq!(store.list_bookings(slot_id).await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn find_booking_by_slot_and_email() {
        let (store, created) = store_with_slot(2).await;
        let slot_id = first_slot(&created);
        let Ok(booking) = store.reserve(&request(slot_id, "a@x.com")).await else {
            panic!("reservation failed");
        };

        let found = store.find_booking(slot_id, "a@x.com").await.ok().flatten();
        assert_eq!(found, Some(booking));
        let missing = store.find_booking(slot_id, "b@x.com").await.ok().flatten();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn held_slot_does_not_block_other_slots() {
        let store = MemoryStore::new();
        let Ok(created) = store
            .create_event(NewEvent {
                title: "Parallel".to_string(),
                description: String::new(),
                slots: vec![
                    NewSlot { time: Utc::now(), max_bookings: 1 },
                    NewSlot { time: Utc::now() + Duration::hours(1), max_bookings: 1 },
                ],
            })
            .await
        else {
            panic!("event creation failed");
        };
        let [held, free] = created.slots.as_slice() else {
            panic!("expected two slots");
        };
        let Ok(held_entry) = store.slot_entry(held.id).await else {
            panic!("slot not found");
        };
        let guard = held_entry.bookings.lock().await;

        let other = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            store.reserve(&request(free.id, "a@x.com")),
        )
        .await;
        assert!(matches!(other, Ok(Ok(_))), "reserve on another slot blocked");

        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.reserve(&request(held.id, "a@x.com")),
        )
        .await;
        assert!(same.is_err(), "reserve on the held slot did not wait");

        drop(guard);
        assert!(store.reserve(&request(held.id, "a@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn bookings_by_email_spans_slots() {
        let store = MemoryStore::new();
        let Ok(created) = store
            .create_event(NewEvent {
                title: "Two slots".to_string(),
                description: String::new(),
                slots: vec![
                    NewSlot { time: Utc::now(), max_bookings: 1 },
                    NewSlot { time: Utc::now() + Duration::hours(1), max_bookings: 1 },
                ],
            })
            .await
        else {
            panic!("event creation failed");
        };
        for slot in &created.slots {
            assert!(store.reserve(&request(slot.id, "a@x.com")).await.is_ok());
        }
        let found = store.bookings_by_email("a@x.com").await.unwrap_or_default();
        assert_eq!(found.len(), 2);
        assert!(store.bookings_by_email("z@x.com").await.unwrap_or_default().is_empty());
    }
}
