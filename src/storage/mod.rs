//! Storage layer: the event catalog and the reservation ledger.
//!
//! [`EventCatalog`] owns events and slots. [`ReservationLedger`] owns
//! bookings and is the only writer of them; its [`ReservationLedger::reserve`]
//! performs the existence, duplicate, and capacity checks and the insert as
//! one atomic unit per slot. Two backends implement both traits:
//!
//! - [`MemoryStore`]: per-slot `tokio::sync::Mutex`.
//! - [`PostgresStore`]: `SELECT … FOR UPDATE` on the slot row inside a
//!   transaction, backed by a `UNIQUE (slot_id, email)` constraint.

pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::config::{ServiceConfig, StorageBackend};
use crate::domain::{Booking, Event, EventId, EventWithSlots, NewBooking, NewEvent, Slot, SlotId};
use crate::error::BookingError;

/// Owner of immutable event and slot definitions.
#[async_trait]
pub trait EventCatalog: Send + Sync + fmt::Debug {
    /// Validates and creates an event with all of its slots atomically.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for invalid input, or
    /// [`BookingError::Storage`] if the store fails; in both cases nothing
    /// is created.
    async fn create_event(&self, new_event: NewEvent) -> Result<EventWithSlots, BookingError>;

    /// Returns an event and its slots ordered by time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`] if the event does not exist.
    async fn get_event(&self, event_id: EventId) -> Result<EventWithSlots, BookingError>;

    /// Returns a single slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist.
    async fn get_slot(&self, slot_id: SlotId) -> Result<Slot, BookingError>;

    /// Returns all events in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    async fn list_events(&self) -> Result<Vec<Event>, BookingError>;
}

/// Authoritative store of bookings.
///
/// Implementations must make `reserve` behave as if all calls targeting the
/// same slot run in some serial order, without serializing calls that target
/// different slots. Reads only observe committed bookings.
#[async_trait]
pub trait ReservationLedger: Send + Sync + fmt::Debug {
    /// Atomically checks the slot and inserts a booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::SlotNotFound`] if the slot does not exist.
    /// - [`BookingError::DuplicateBooking`] if the e-mail already booked it.
    /// - [`BookingError::SlotFull`] if the slot is at capacity.
    /// - [`BookingError::Storage`] if the store fails; nothing is inserted.
    async fn reserve(&self, request: &NewBooking) -> Result<Booking, BookingError>;

    /// Number of committed bookings for a slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist.
    async fn count_bookings(&self, slot_id: SlotId) -> Result<u32, BookingError>;

    /// Committed bookings for a slot, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist.
    async fn list_bookings(&self, slot_id: SlotId) -> Result<Vec<Booking>, BookingError>;

    /// The booking held by `email` on a slot, if any. `email` must already
    /// be normalized.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    async fn find_booking(
        &self,
        slot_id: SlotId,
        email: &str,
    ) -> Result<Option<Booking>, BookingError>;

    /// All bookings held by a normalized e-mail address, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, BookingError>;
}

/// The catalog and ledger handles of the selected backend.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Event and slot store.
    pub catalog: Arc<dyn EventCatalog>,
    /// Booking store.
    pub ledger: Arc<dyn ReservationLedger>,
}

impl Storage {
    /// Builds both handles over a single [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            catalog: Arc::clone(&store) as Arc<dyn EventCatalog>,
            ledger: store,
        }
    }

    /// Opens the backend selected in `config`.
    ///
    /// For PostgreSQL this connects the pool and runs embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the database cannot be reached
    /// or migrations fail.
    pub async fn open(config: &ServiceConfig) -> Result<Self, BookingError> {
        match config.storage_backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::Postgres => {
                let store = Arc::new(PostgresStore::connect(config).await?);
                store.migrate().await?;
                Ok(Self {
                    catalog: Arc::clone(&store) as Arc<dyn EventCatalog>,
                    ledger: store,
                })
            }
        }
    }
}
