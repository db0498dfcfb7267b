//! # slot-booking
//!
//! REST API for publishing events with capacity-limited time slots and
//! reserving places in them.
//!
//! The interesting part is the reservation core: under any number of
//! concurrent requests, a slot never receives more bookings than its
//! capacity and an e-mail address never books the same slot twice.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BookingService / QueryService (service/)
//!     │
//!     ├── EventCatalog + ReservationLedger (storage/)
//!     │       ├── MemoryStore   (per-slot mutex)
//!     │       └── PostgresStore (slot row lock + unique constraint)
//!     │
//!     └── Domain types and validation (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;
pub mod telemetry;
