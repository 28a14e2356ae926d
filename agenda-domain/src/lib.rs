pub mod day;
pub mod reservation;
pub mod request;

pub use day::CalendarDay;
pub use reservation::{Reservation, ReservationId, ReservationStatus};
pub use request::{CreateReservationRequest, NewReservation};

use rust_decimal::Decimal;

/// Reasons a creation request or status value is refused before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}
