//! Booking service: resolves the slot, then hands off to the ledger.

use std::sync::Arc;

use crate::domain::{Booking, EventId, NewBooking, SlotId};
use crate::error::{BookingError, ErrorClass};
use crate::storage::{EventCatalog, ReservationLedger};

/// Orchestrates reservation requests.
///
/// Stateless coordinator over an [`EventCatalog`] and a
/// [`ReservationLedger`]. Every reservation follows the pattern: validate
/// input → resolve slot → atomic reserve → log outcome. Conflicts are
/// returned as-is and never retried here.
#[derive(Debug, Clone)]
pub struct BookingService {
    catalog: Arc<dyn EventCatalog>,
    ledger: Arc<dyn ReservationLedger>,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(catalog: Arc<dyn EventCatalog>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Books `slot_id` of `event_id` for the given person.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] for a blank name or malformed e-mail.
    /// - [`BookingError::SlotNotFound`] if the slot does not exist or
    ///   belongs to a different event.
    /// - [`BookingError::DuplicateBooking`] / [`BookingError::SlotFull`]
    ///   from the ledger.
    /// - [`BookingError::Storage`] if the store fails.
    pub async fn book(
        &self,
        event_id: EventId,
        slot_id: SlotId,
        name: &str,
        email: &str,
    ) -> Result<Booking, BookingError> {
        let request = NewBooking::new(slot_id, name, email)?;

        let slot = self.catalog.get_slot(slot_id).await?;
        if slot.event_id != event_id {
            return Err(BookingError::SlotNotFound(slot_id));
        }

        match self.ledger.reserve(&request).await {
            Ok(booking) => {
                tracing::info!(%event_id, %slot_id, booking_id = %booking.id, "booking confirmed");
                Ok(booking)
            }
            Err(err) => {
                let class = err.class();
                if class == ErrorClass::Storage {
                    tracing::warn!(
                        %event_id,
                        %slot_id,
                        class = class.as_str(),
                        retryable = err.is_retryable(),
                        error = %err,
                        "reservation failed"
                    );
                } else {
                    tracing::debug!(
                        %event_id,
                        %slot_id,
                        class = class.as_str(),
                        error = %err,
                        "reservation rejected"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventWithSlots, NewEvent, NewSlot};
    use crate::storage::Storage;
    use chrono::Utc;

    async fn setup(capacity: i64) -> (BookingService, Storage, EventWithSlots) {
        let storage = Storage::in_memory();
        let Ok(created) = storage
            .catalog
            .create_event(NewEvent {
                title: "Yoga".to_string(),
                description: "Morning class".to_string(),
                slots: vec![NewSlot { time: Utc::now(), max_bookings: capacity }],
            })
            .await
        else {
            panic!("event creation failed");
        };
        let service =
            BookingService::new(Arc::clone(&storage.catalog), Arc::clone(&storage.ledger));
        (service, storage, created)
    }

    fn slot_of(created: &EventWithSlots) -> SlotId {
        let Some(slot) = created.slots.first() else {
            panic!("no slot");
        };
        slot.id
    }

    #[tokio::test]
    async fn book_succeeds_then_rejects_duplicate() {
        let (service, storage, created) = setup(3).await;
        let slot_id = slot_of(&created);

        let first = service.book(created.event.id, slot_id, "Ann", "a@x.com").await;
        assert!(first.is_ok());
        let second = service.book(created.event.id, slot_id, "Ann", "a@x.com").await;
        assert!(matches!(second, Err(BookingError::DuplicateBooking { .. })));
        assert_eq!(storage.ledger.count_bookings(slot_id).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn slot_of_another_event_is_not_found() {
        let (service, _storage, created) = setup(3).await;
        let result = service
            .book(EventId::new(), slot_of(&created), "Ann", "a@x.com")
            .await;
        assert!(matches!(result, Err(BookingError::SlotNotFound(_))));
    }

    #[tokio::test]
    async fn unknown_slot_is_not_found() {
        let (service, _storage, created) = setup(3).await;
        let result = service
            .book(created.event.id, SlotId::new(), "Ann", "a@x.com")
            .await;
        assert!(matches!(result, Err(BookingError::SlotNotFound(_))));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_ledger() {
        let (service, storage, created) = setup(3).await;
        let slot_id = slot_of(&created);
        let result = service.book(created.event.id, slot_id, "Ann", "not-an-email").await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert_eq!(storage.ledger.count_bookings(slot_id).await.ok(), Some(0));
    }
}
