//! Booking handlers: reserve a slot, list a slot's bookings, look up a
//! user's bookings.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{BookSlotRequest, BookingResponse, SlotBookingDto, UserBookingDto};
use crate::app_state::AppState;
use crate::domain::{EventId, SlotId};
use crate::error::{BookingError, ErrorResponse};

/// `POST /events/{event_id}/bookings` — Reserve a place in a slot.
///
/// # Errors
///
/// Returns [`BookingError::SlotNotFound`], [`BookingError::DuplicateBooking`],
/// [`BookingError::SlotFull`], or [`BookingError::Validation`].
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/bookings",
    tag = "Bookings",
    summary = "Book a slot",
    description = "Atomically reserves one place in a slot. Each e-mail address may book a slot once.",
    params(
        ("event_id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = BookSlotRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = BookingResponse),
        (status = 400, description = "Invalid name or e-mail", body = ErrorResponse),
        (status = 404, description = "Slot not found for this event", body = ErrorResponse),
        (status = 409, description = "Slot full or already booked", body = ErrorResponse),
    )
)]
pub async fn book_slot(
    State(state): State<AppState>,
    Path(event_id): Path<uuid::Uuid>,
    Json(req): Json<BookSlotRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let event_id = EventId::from_uuid(event_id);
    let booking = state
        .booking_service
        .book(event_id, SlotId::from_uuid(req.slot_id), &req.name, &req.email)
        .await?;

    let response = BookingResponse {
        message: "booking confirmed".to_string(),
        booking_id: booking.id.into(),
        event_id: event_id.into(),
        slot_id: booking.slot_id.into(),
        name: booking.name,
        email: booking.email,
        created_at: booking.created_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /events/{event_id}/slots/{slot_id}/bookings` — Bookings of a slot.
///
/// # Errors
///
/// Returns [`BookingError::SlotNotFound`] if the slot is not part of the
/// event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/slots/{slot_id}/bookings",
    tag = "Bookings",
    summary = "List a slot's bookings",
    params(
        ("event_id" = uuid::Uuid, Path, description = "Event UUID"),
        ("slot_id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 200, description = "Bookings, oldest first", body = Vec<SlotBookingDto>),
        (status = 404, description = "Slot not found for this event", body = ErrorResponse),
    )
)]
pub async fn list_slot_bookings(
    State(state): State<AppState>,
    Path((event_id, slot_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, BookingError> {
    let bookings: Vec<SlotBookingDto> = state
        .query_service
        .slot_bookings(EventId::from_uuid(event_id), SlotId::from_uuid(slot_id))
        .await?
        .into_iter()
        .map(SlotBookingDto::from)
        .collect();
    Ok(Json(bookings))
}

/// `GET /users/{email}/bookings` — A user's bookings across all events.
///
/// # Errors
///
/// Returns [`BookingError::Storage`] if the store fails. Unknown addresses
/// yield an empty list.
#[utoipa::path(
    get,
    path = "/api/v1/users/{email}/bookings",
    tag = "Bookings",
    summary = "Bookings by e-mail",
    params(
        ("email" = String, Path, description = "E-mail address (case-insensitive)"),
    ),
    responses(
        (status = 200, description = "The user's bookings, oldest first", body = Vec<UserBookingDto>),
    )
)]
pub async fn user_bookings(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, BookingError> {
    let bookings: Vec<UserBookingDto> = state
        .query_service
        .bookings_by_email(&email)
        .await?
        .into_iter()
        .map(UserBookingDto::from)
        .collect();
    Ok(Json(bookings))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/bookings", post(book_slot))
        .route(
            "/events/{event_id}/slots/{slot_id}/bookings",
            get(list_slot_bookings),
        )
        .route("/users/{email}/bookings", get(user_bookings))
}
