//! PostgreSQL implementation of the catalog and the ledger.
//!
//! `reserve` runs inside one transaction that locks the slot row with
//! `SELECT … FOR UPDATE` before checking and inserting. Concurrent
//! reservations on the same slot queue on that row lock; reservations on
//! other slots lock other rows and proceed in parallel. The
//! `bookings_slot_email_key` unique constraint backs the duplicate check,
//! and `slots_event_time_key` backs the duplicate slot-time check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{EventCatalog, ReservationLedger};
use crate::config::ServiceConfig;
use crate::domain::{Booking, Event, EventId, EventWithSlots, NewBooking, NewEvent, Slot, SlotId};
use crate::error::BookingError;

type EventRow = (Uuid, String, String, DateTime<Utc>);
type SlotRow = (Uuid, Uuid, DateTime<Utc>, i32);
type BookingRow = (Uuid, Uuid, String, String, DateTime<Utc>);

const SLOT_COLUMNS: &str = "id, event_id, starts_at, max_bookings";
const BOOKING_COLUMNS: &str = "id, slot_id, name, email, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool using the database settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the database is unreachable.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, BookingError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_connect_timeout())
            .connect(&config.database_url)
            .await
            .map_err(storage_error)?;
        tracing::info!("connected to postgres");
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), BookingError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Storage(format!("migration failed: {e}")))
    }
}

fn storage_error(err: sqlx::Error) -> BookingError {
    tracing::warn!(error = %err, "storage operation failed");
    BookingError::Storage(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn event_from_row((id, title, description, created_at): EventRow) -> Event {
    Event {
        id: EventId::from_uuid(id),
        title,
        description,
        created_at,
    }
}

fn slot_from_row((id, event_id, time, max_bookings): SlotRow) -> Result<Slot, BookingError> {
    let max_bookings = u32::try_from(max_bookings)
        .map_err(|_| BookingError::Internal(format!("slot {id} has capacity {max_bookings}")))?;
    Ok(Slot {
        id: SlotId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        time,
        max_bookings,
    })
}

fn booking_from_row((id, slot_id, name, email, created_at): BookingRow) -> Booking {
    Booking {
        id: id.into(),
        slot_id: SlotId::from_uuid(slot_id),
        name,
        email,
        created_at,
    }
}

fn to_count(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[async_trait]
impl EventCatalog for PostgresStore {
    async fn create_event(&self, new_event: NewEvent) -> Result<EventWithSlots, BookingError> {
        let records = new_event.into_records()?;
        let event = &records.event;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("INSERT INTO events (id, title, description, created_at) VALUES ($1, $2, $3, $4)")
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.created_at)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for slot in &records.slots {
            let max_bookings = i32::try_from(slot.max_bookings).map_err(|_| {
                BookingError::Validation(format!("invalid capacity {}", slot.max_bookings))
            })?;
            sqlx::query(
                "INSERT INTO slots (id, event_id, starts_at, max_bookings) VALUES ($1, $2, $3, $4)",
            )
            .bind(slot.id.as_uuid())
            .bind(event.id.as_uuid())
            .bind(slot.time)
            .bind(max_bookings)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BookingError::Validation(format!(
                        "duplicate slot time {}",
                        slot.time.to_rfc3339()
                    ))
                } else {
                    storage_error(e)
                }
            })?;
        }

        tx.commit().await.map_err(storage_error)?;

        tracing::info!(event_id = %event.id, slots = records.slots.len(), "event created");
        Ok(records)
    }

    async fn get_event(&self, event_id: EventId) -> Result<EventWithSlots, BookingError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, title, description, created_at FROM events WHERE id = $1",
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(BookingError::EventNotFound(event_id))?;

        let slots = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE event_id = $1 ORDER BY starts_at ASC"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(slot_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(EventWithSlots {
            event: event_from_row(row),
            slots,
        })
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Slot, BookingError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1"
        ))
        .bind(slot_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(BookingError::SlotNotFound(slot_id))?;
        slot_from_row(row)
    }

    async fn list_events(&self) -> Result<Vec<Event>, BookingError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, title, description, created_at FROM events ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(event_from_row).collect())
    }
}

#[async_trait]
impl ReservationLedger for PostgresStore {
    async fn reserve(&self, request: &NewBooking) -> Result<Booking, BookingError> {
        let slot_id = request.slot_id;
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Row lock on the slot; held until commit or rollback.
        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT max_bookings FROM slots WHERE id = $1 FOR UPDATE",
        )
        .bind(slot_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;
        // Early returns drop `tx`, which rolls it back.
        let Some(capacity) = capacity else {
            return Err(BookingError::SlotNotFound(slot_id));
        };

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE slot_id = $1 AND email = $2)",
        )
        .bind(slot_id.as_uuid())
        .bind(&request.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;
        if duplicate {
            return Err(BookingError::DuplicateBooking {
                slot_id,
                email: request.email.clone(),
            });
        }

        let booked = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE slot_id = $1")
            .bind(slot_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
        if booked >= i64::from(capacity) {
            return Err(BookingError::SlotFull(slot_id));
        }

        let booking = Booking::confirm(request);
        sqlx::query(
            "INSERT INTO bookings (id, slot_id, name, email, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(booking.id.as_uuid())
        .bind(slot_id.as_uuid())
        .bind(&booking.name)
        .bind(&booking.email)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::DuplicateBooking {
                    slot_id,
                    email: request.email.clone(),
                }
            } else {
                storage_error(e)
            }
        })?;

        tx.commit().await.map_err(storage_error)?;
        Ok(booking)
    }

    async fn count_bookings(&self, slot_id: SlotId) -> Result<u32, BookingError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT (SELECT COUNT(*) FROM bookings WHERE slot_id = s.id) FROM slots s WHERE s.id = $1",
        )
        .bind(slot_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(BookingError::SlotNotFound(slot_id))?;
        Ok(to_count(count))
    }

    async fn list_bookings(&self, slot_id: SlotId) -> Result<Vec<Booking>, BookingError> {
        // Distinguish an unknown slot from an empty one.
        self.get_slot(slot_id).await?;

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE slot_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(slot_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(booking_from_row).collect())
    }

    async fn find_booking(
        &self,
        slot_id: SlotId,
        email: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE slot_id = $1 AND email = $2"
        ))
        .bind(slot_id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(booking_from_row))
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, BookingError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE email = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(booking_from_row).collect())
    }
}
