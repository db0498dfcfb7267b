//! Events and their bookable slots.
//!
//! Events and slots are created together and never change afterwards.
//! [`NewEvent::into_records`] is the single place where creation input is
//! validated and turned into records, so every storage backend enforces the
//! same rules.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::{EventId, SlotId, now, stored_precision};
use crate::error::BookingError;

/// Maximum length of an event title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of an event description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2_000;

/// Largest capacity a single slot may declare.
///
/// Capacities are stored as 32-bit signed integers in PostgreSQL.
pub const MAX_SLOT_CAPACITY: i64 = i32::MAX as i64;

/// A published event. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Short human-readable title.
    pub title: String,
    /// Free-form description (may be empty).
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A bookable time slot belonging to exactly one [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Slot identifier.
    pub id: SlotId,
    /// Owning event.
    pub event_id: EventId,
    /// Start time of the slot, at microsecond precision.
    pub time: DateTime<Utc>,
    /// Maximum number of bookings this slot accepts (always positive).
    pub max_bookings: u32,
}

/// Slot definition supplied when creating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    /// Start time of the slot.
    pub time: DateTime<Utc>,
    /// Requested capacity. Signed so that non-positive input can be rejected
    /// with a validation error instead of a deserialization failure.
    pub max_bookings: i64,
}

/// Input for creating an event together with all of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Slots to create with the event.
    pub slots: Vec<NewSlot>,
}

/// An event together with its slots, ordered by slot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWithSlots {
    /// The event.
    pub event: Event,
    /// Its slots, ordered by `time` ascending.
    pub slots: Vec<Slot>,
}

/// A slot together with its current number of bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAvailability {
    /// The slot.
    pub slot: Slot,
    /// Committed bookings at the time of the read.
    pub booked: u32,
}

impl SlotAvailability {
    /// Remaining capacity of the slot.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.slot.max_bookings.saturating_sub(self.booked)
    }
}

/// An event with live booking counts for each of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    /// The event.
    pub event: Event,
    /// Its slots with current booking counts, ordered by slot time.
    pub slots: Vec<SlotAvailability>,
}

impl NewEvent {
    /// Validates the input and assigns identifiers to the event and slots.
    ///
    /// Titles are trimmed, slot times are truncated to microseconds before
    /// duplicates are checked, and slots are returned ordered by time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] when the title is blank or too
    /// long, the description is too long, the slot list is empty, a slot
    /// declares a non-positive or oversized capacity, or two slots share the
    /// same time.
    pub fn into_records(self) -> Result<EventWithSlots, BookingError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(BookingError::Validation("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(BookingError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(BookingError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if self.slots.is_empty() {
            return Err(BookingError::Validation(
                "an event needs at least one slot".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.slots.len());
        for slot in &self.slots {
            if slot.max_bookings <= 0 {
                return Err(BookingError::Validation(format!(
                    "slot at {} must allow at least one booking",
                    slot.time.to_rfc3339()
                )));
            }
            if slot.max_bookings > MAX_SLOT_CAPACITY {
                return Err(BookingError::Validation(format!(
                    "slot at {} exceeds the maximum capacity of {MAX_SLOT_CAPACITY}",
                    slot.time.to_rfc3339()
                )));
            }
            let time = stored_precision(slot.time);
            if !seen.insert(time) {
                return Err(BookingError::Validation(format!(
                    "duplicate slot time {}",
                    time.to_rfc3339()
                )));
            }
        }

        let event = Event {
            id: EventId::new(),
            title,
            description: self.description,
            created_at: now(),
        };

        let mut slots = self
            .slots
            .into_iter()
            .map(|slot| {
                let max_bookings = u32::try_from(slot.max_bookings).map_err(|_| {
                    BookingError::Validation(format!("invalid capacity {}", slot.max_bookings))
                })?;
                Ok(Slot {
                    id: SlotId::new(),
                    event_id: event.id,
                    time: stored_precision(slot.time),
                    max_bookings,
                })
            })
            .collect::<Result<Vec<_>, BookingError>>()?;
        slots.sort_by_key(|slot| slot.time);

        Ok(EventWithSlots { event, slots })
    }
}
