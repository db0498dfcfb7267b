//! Booking error types with HTTP status code mapping.
//!
//! [`BookingError`] is the single error type of the reservation core and the
//! REST layer. Each variant maps to a specific HTTP status code and a
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventId, SlotId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "message": "slot is full: 1f0c…",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Outcome classes of the reservation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input; rejected before any state is touched.
    Validation,
    /// A referenced event or slot does not exist.
    NotFound,
    /// The request is well-formed but would violate a booking invariant.
    Conflict,
    /// The backing store failed.
    Storage,
}

impl ErrorClass {
    /// Lowercase name used as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }
}

/// Error enum for every core and API operation.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status                 |
/// |-----------|------------|-----------------------------|
/// | 1000–1999 | Validation | 400 Bad Request             |
/// | 2000–2999 | Not Found  | 404 Not Found               |
/// | 3000–3999 | Storage    | 500 / 503                   |
/// | 4000–4999 | Conflict   | 409 Conflict                |
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Slot with the given ID was not found, or belongs to another event.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// The e-mail address already holds a booking for this slot.
    #[error("{email} has already booked slot {slot_id}")]
    DuplicateBooking {
        /// Target slot.
        slot_id: SlotId,
        /// Normalized e-mail address.
        email: String,
    },

    /// The slot has no remaining capacity.
    #[error("slot is full: {0}")]
    SlotFull(SlotId),

    /// The backing store is unavailable or aborted the transaction.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::SlotNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::DuplicateBooking { .. } => 4001,
            Self::SlotFull(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::SlotNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateBooking { .. } | Self::SlotFull(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the outcome class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::EventNotFound(_) | Self::SlotNotFound(_) => ErrorClass::NotFound,
            Self::DuplicateBooking { .. } | Self::SlotFull(_) => ErrorClass::Conflict,
            Self::Storage(_) | Self::Internal(_) => ErrorClass::Storage,
        }
    }

    /// Returns `true` if a caller may retry the identical request (with
    /// backoff). Conflicts are terminal; only storage failures qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409_and_are_terminal() {
        let full = BookingError::SlotFull(SlotId::new());
        let duplicate = BookingError::DuplicateBooking {
            slot_id: SlotId::new(),
            email: "a@x.com".to_string(),
        };
        for err in [full, duplicate] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
            assert_eq!(err.class(), ErrorClass::Conflict);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            BookingError::EventNotFound(EventId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BookingError::SlotNotFound(SlotId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn class_names_are_stable_log_fields() {
        assert_eq!(BookingError::Validation("bad".to_string()).class().as_str(), "validation");
        assert_eq!(BookingError::SlotNotFound(SlotId::new()).class().as_str(), "not_found");
        assert_eq!(BookingError::SlotFull(SlotId::new()).class().as_str(), "conflict");
        assert_eq!(BookingError::Internal("bug".to_string()).class().as_str(), "storage");
    }

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(BookingError::Storage("connection reset".to_string()).is_retryable());
        assert!(!BookingError::Internal("bug".to_string()).is_retryable());
        assert!(!BookingError::Validation("bad".to_string()).is_retryable());
    }

    #[test]
    fn response_carries_status_code() {
        let response = BookingError::SlotFull(SlotId::new()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = BookingError::Validation("empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
