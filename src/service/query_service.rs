//! Read-only queries over the catalog and the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{
    Booking, EventDetails, EventId, SlotAvailability, SlotId, UserBooking, normalize_email,
};
use crate::error::BookingError;
use crate::storage::{EventCatalog, ReservationLedger};

/// Read side of the booking core. Never mutates state.
#[derive(Debug, Clone)]
pub struct QueryService {
    catalog: Arc<dyn EventCatalog>,
    ledger: Arc<dyn ReservationLedger>,
}

impl QueryService {
    /// Creates a new `QueryService`.
    #[must_use]
    pub fn new(catalog: Arc<dyn EventCatalog>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Returns every booking held by `email`, joined with its slot.
    ///
    /// An address that is malformed or has no bookings yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    pub async fn bookings_by_email(&self, email: &str) -> Result<Vec<UserBooking>, BookingError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(Vec::new());
        };

        let bookings = self.ledger.bookings_by_email(&email).await?;
        let mut slots = HashMap::new();
        let mut result = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let cached = slots.get(&booking.slot_id).cloned();
            let slot = match cached {
                Some(slot) => slot,
                None => {
                    let slot = self.catalog.get_slot(booking.slot_id).await?;
                    slots.insert(booking.slot_id, slot.clone());
                    slot
                }
            };
            result.push(UserBooking {
                booking_id: booking.id,
                event_id: slot.event_id,
                slot_id: slot.id,
                slot_time: slot.time,
                name: booking.name,
            });
        }
        Ok(result)
    }

    /// Returns an event with the current booking count of each slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`] if the event does not exist.
    pub async fn event_with_slots(&self, event_id: EventId) -> Result<EventDetails, BookingError> {
        let found = self.catalog.get_event(event_id).await?;
        let mut slots = Vec::with_capacity(found.slots.len());
        for slot in found.slots {
            let booked = self.ledger.count_bookings(slot.id).await?;
            slots.push(SlotAvailability { slot, booked });
        }
        Ok(EventDetails {
            event: found.event,
            slots,
        })
    }

    /// Returns the bookings of one slot of an event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist or
    /// belongs to a different event.
    pub async fn slot_bookings(
        &self,
        event_id: EventId,
        slot_id: SlotId,
    ) -> Result<Vec<Booking>, BookingError> {
        let slot = self.catalog.get_slot(slot_id).await?;
        if slot.event_id != event_id {
            return Err(BookingError::SlotNotFound(slot_id));
        }
        self.ledger.list_bookings(slot_id).await
    }
}
