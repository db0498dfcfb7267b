//! Event-related DTOs for create, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Event, EventDetails, EventWithSlots, NewEvent, NewSlot, SlotAvailability};

/// One slot in a `POST /events` request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SlotRequest {
    /// Slot start time (RFC 3339).
    pub time: DateTime<Utc>,
    /// Maximum number of bookings; must be positive.
    pub max_bookings: i64,
}

/// Request body for `POST /events`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Event title.
    pub title: String,
    /// Event description.
    #[serde(default)]
    pub description: String,
    /// Slots to publish with the event.
    pub slots: Vec<SlotRequest>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            slots: req
                .slots
                .into_iter()
                .map(|s| NewSlot {
                    time: s.time,
                    max_bookings: s.max_bookings,
                })
                .collect(),
        }
    }
}

/// Event summary used by list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDto {
    /// Event identifier.
    pub id: Uuid,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.into(),
            title: event.title,
            description: event.description,
            created_at: event.created_at,
        }
    }
}

/// A slot with its live booking state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotDto {
    /// Slot identifier.
    pub id: Uuid,
    /// Slot start time.
    pub time: DateTime<Utc>,
    /// Declared capacity.
    pub max_bookings: u32,
    /// Committed bookings.
    pub booked: u32,
    /// Remaining capacity.
    pub available: u32,
}

impl From<SlotAvailability> for SlotDto {
    fn from(entry: SlotAvailability) -> Self {
        let available = entry.available();
        Self {
            id: entry.slot.id.into(),
            time: entry.slot.time,
            max_bookings: entry.slot.max_bookings,
            booked: entry.booked,
            available,
        }
    }
}

/// Full event detail for `GET /events/{event_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDetailsDto {
    /// Event identifier.
    pub id: Uuid,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Slots ordered by time.
    pub slots: Vec<SlotDto>,
}

impl From<EventDetails> for EventDetailsDto {
    fn from(details: EventDetails) -> Self {
        Self {
            id: details.event.id.into(),
            title: details.event.title,
            description: details.event.description,
            created_at: details.event.created_at,
            slots: details.slots.into_iter().map(SlotDto::from).collect(),
        }
    }
}

impl From<EventWithSlots> for EventDetailsDto {
    fn from(created: EventWithSlots) -> Self {
        Self::from(EventDetails {
            event: created.event,
            slots: created
                .slots
                .into_iter()
                .map(|slot| SlotAvailability { slot, booked: 0 })
                .collect(),
        })
    }
}

/// Response body for `POST /events` (201 Created).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateEventResponse {
    /// Fixed confirmation message.
    pub message: String,
    /// New event identifier.
    pub id: Uuid,
    /// The created event echoed back with its slots.
    pub event: EventDetailsDto,
}
