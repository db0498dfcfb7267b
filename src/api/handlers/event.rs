//! Event handlers: create, list, get.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateEventRequest, CreateEventResponse, EventDetailsDto, EventDto};
use crate::app_state::AppState;
use crate::domain::{EventId, NewEvent};
use crate::error::{BookingError, ErrorResponse};

/// `POST /events` — Publish an event with its slots.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] on an empty slot list, a
/// non-positive capacity, or duplicate slot times.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates an event together with all of its slots in one atomic step.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = CreateEventResponse),
        (status = 400, description = "Invalid event or slots", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let created = state.catalog.create_event(NewEvent::from(req)).await?;

    let response = CreateEventResponse {
        message: "event created".to_string(),
        id: created.event.id.into(),
        event: EventDetailsDto::from(created),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /events` — List events in creation order.
///
/// # Errors
///
/// Returns [`BookingError::Storage`] if the store fails.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns all events in the order they were created.",
    responses(
        (status = 200, description = "Event list", body = Vec<EventDto>),
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, BookingError> {
    let events: Vec<EventDto> = state
        .catalog
        .list_events()
        .await?
        .into_iter()
        .map(EventDto::from)
        .collect();
    Ok(Json(events))
}

/// `GET /events/{event_id}` — Event details with live slot availability.
///
/// # Errors
///
/// Returns [`BookingError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}",
    tag = "Events",
    summary = "Get event details",
    description = "Returns the event and each slot's capacity, booked count, and remaining places.",
    params(
        ("event_id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventDetailsDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let details = state
        .query_service
        .event_with_slots(EventId::from_uuid(event_id))
        .await?;
    Ok(Json(EventDetailsDto::from(details)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/{event_id}", get(get_event))
}
