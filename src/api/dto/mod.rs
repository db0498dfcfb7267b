//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are exposed as plain UUID strings and timestamps as
//! RFC 3339.

pub mod booking_dto;
pub mod event_dto;

pub use booking_dto::*;
pub use event_dto::*;
