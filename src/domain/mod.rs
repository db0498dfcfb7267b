//! Domain layer: identifiers, events, slots, and bookings.
//!
//! These types are storage-agnostic. Validation of creation and
//! reservation input lives here so that every backend applies the same
//! rules before touching state.

use chrono::{DateTime, SubsecRound, Utc};

pub mod booking;
pub mod event;
pub mod ids;

pub use booking::{Booking, NewBooking, UserBooking, normalize_email};
pub use event::{Event, EventDetails, EventWithSlots, NewEvent, NewSlot, Slot, SlotAvailability};
pub use ids::{BookingId, EventId, SlotId};

/// Truncates `time` to microseconds, the resolution of PostgreSQL
/// `TIMESTAMPTZ`. Every timestamp a record carries goes through here.
#[must_use]
pub fn stored_precision(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(6)
}

/// The current time at [`stored_precision`].
#[must_use]
pub fn now() -> DateTime<Utc> {
    stored_precision(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};

    #[test]
    fn stored_precision_drops_sub_microsecond_part() {
        let base = stored_precision(Utc::now());
        let shifted = base + Duration::nanoseconds(999);
        assert_eq!(stored_precision(shifted), base);
        assert_eq!(now().nanosecond() % 1_000, 0);
    }
}
