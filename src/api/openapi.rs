//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto::{
    BookSlotRequest, BookingResponse, CreateEventRequest, CreateEventResponse, EventDetailsDto,
    EventDto, SlotBookingDto, SlotDto, SlotRequest, UserBookingDto,
};
use super::handlers::{booking, event, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Root OpenAPI document of the service.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "slot-booking",
        description = "Publish events with capacity-limited slots and reserve them."
    ),
    paths(
        event::create_event,
        event::list_events,
        event::get_event,
        booking::book_slot,
        booking::list_slot_bookings,
        booking::user_bookings,
        system::health_handler,
    ),
    components(schemas(
        CreateEventRequest,
        SlotRequest,
        CreateEventResponse,
        EventDto,
        EventDetailsDto,
        SlotDto,
        BookSlotRequest,
        BookingResponse,
        SlotBookingDto,
        UserBookingDto,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Events", description = "Event publication and lookup"),
        (name = "Bookings", description = "Slot reservations"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;
