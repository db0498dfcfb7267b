//! Booking records and reservation requests.

use chrono::{DateTime, Utc};

use super::{BookingId, EventId, SlotId, now};
use crate::error::BookingError;

/// Maximum length of a booker's name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of an e-mail address, in characters.
pub const MAX_EMAIL_LEN: usize = 254;

/// A confirmed reservation of one user against one slot.
///
/// Created only by a [`crate::storage::ReservationLedger`]; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// Reserved slot.
    pub slot_id: SlotId,
    /// Name of the person who booked.
    pub name: String,
    /// Normalized (trimmed, lowercase) e-mail address.
    pub email: String,
    /// Commit timestamp, at microsecond precision.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Materializes a validated request into a booking record.
    #[must_use]
    pub fn confirm(request: &NewBooking) -> Self {
        Self {
            id: BookingId::new(),
            slot_id: request.slot_id,
            name: request.name.clone(),
            email: request.email.clone(),
            created_at: now(),
        }
    }
}

/// A validated reservation request.
///
/// Construct through [`NewBooking::new`]; the fields are already normalized
/// when a ledger sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Target slot.
    pub slot_id: SlotId,
    /// Trimmed name.
    pub name: String,
    /// Normalized e-mail address.
    pub email: String,
}

impl NewBooking {
    /// Validates and normalizes a reservation request.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the name is blank or too
    /// long, or the e-mail address is malformed.
    pub fn new(slot_id: SlotId, name: &str, email: &str) -> Result<Self, BookingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(BookingError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        Ok(Self {
            slot_id,
            name: name.to_string(),
            email: normalize_email(email)?,
        })
    }
}

/// Trims and lowercases an e-mail address, checking its basic shape.
///
/// Addresses compare case-insensitively, so `Ann@Example.com` and
/// `ann@example.com` identify the same booker.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] unless the address has exactly one
/// `@` with a non-empty local part and domain, and no whitespace.
pub fn normalize_email(raw: &str) -> Result<String, BookingError> {
    let email = raw.trim().to_lowercase();
    let invalid = || BookingError::Validation(format!("invalid e-mail address: {raw:?}"));

    if email.is_empty() || email.chars().count() > MAX_EMAIL_LEN {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut parts = email.split('@');
    let well_formed = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );
    if !well_formed {
        return Err(invalid());
    }
    Ok(email)
}

/// One entry of a user's booking history, joined with its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBooking {
    /// Booking identifier.
    pub booking_id: BookingId,
    /// Event the slot belongs to.
    pub event_id: EventId,
    /// Booked slot.
    pub slot_id: SlotId,
    /// Start time of the booked slot.
    pub slot_time: DateTime<Utc>,
    /// Name given at booking time.
    pub name: String,
}
