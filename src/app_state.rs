//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{BookingService, QueryService};
use crate::storage::{EventCatalog, Storage};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event catalog for creating and listing events.
    pub catalog: Arc<dyn EventCatalog>,
    /// Reservation write path.
    pub booking_service: Arc<BookingService>,
    /// Read-only queries.
    pub query_service: Arc<QueryService>,
}

impl AppState {
    /// Wires the services over the given storage handles.
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            catalog: Arc::clone(&storage.catalog),
            booking_service: Arc::new(BookingService::new(
                Arc::clone(&storage.catalog),
                Arc::clone(&storage.ledger),
            )),
            query_service: Arc::new(QueryService::new(
                Arc::clone(&storage.catalog),
                Arc::clone(&storage.ledger),
            )),
        }
    }
}
