//! Service layer: business logic orchestration.
//!
//! [`BookingService`] is the write path (one atomic reservation per call);
//! [`QueryService`] is the read path over the catalog and the ledger.

pub mod booking_service;
pub mod query_service;

pub use booking_service::BookingService;
pub use query_service::QueryService;
