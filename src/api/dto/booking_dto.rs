//! Booking DTOs for the reservation and lookup endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Booking, UserBooking};

/// Request body for `POST /events/{event_id}/bookings`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookSlotRequest {
    /// Slot to reserve; must belong to the event in the path.
    pub slot_id: Uuid,
    /// Name of the person booking.
    pub name: String,
    /// Contact e-mail; one booking per address per slot.
    pub email: String,
}

/// Response body for a confirmed booking (201 Created).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingResponse {
    /// Fixed confirmation message.
    pub message: String,
    /// New booking identifier.
    pub booking_id: Uuid,
    /// Event the slot belongs to.
    pub event_id: Uuid,
    /// Reserved slot.
    pub slot_id: Uuid,
    /// Name given at booking time.
    pub name: String,
    /// Normalized e-mail address.
    pub email: String,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// One booking of a slot, as listed for organizers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotBookingDto {
    /// Booking identifier.
    pub booking_id: Uuid,
    /// Name given at booking time.
    pub name: String,
    /// Normalized e-mail address.
    pub email: String,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for SlotBookingDto {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id.into(),
            name: booking.name,
            email: booking.email,
            created_at: booking.created_at,
        }
    }
}

/// One entry of `GET /users/{email}/bookings`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserBookingDto {
    /// Booking identifier.
    pub booking_id: Uuid,
    /// Event the slot belongs to.
    pub event_id: Uuid,
    /// Booked slot.
    pub slot_id: Uuid,
    /// Start time of the booked slot.
    pub slot_time: DateTime<Utc>,
    /// Name given at booking time.
    pub name: String,
}

impl From<UserBooking> for UserBookingDto {
    fn from(entry: UserBooking) -> Self {
        Self {
            booking_id: entry.booking_id.into(),
            event_id: entry.event_id.into(),
            slot_id: entry.slot_id.into(),
            slot_time: entry.slot_time,
            name: entry.name,
        }
    }
}
