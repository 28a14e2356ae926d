pub mod booking;
pub mod slots;

pub use booking::BookingService;

use agenda_domain::{CalendarDay, ValidationError};
use agenda_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Slot {time_slot} on {date} is already booked")]
    Conflict { date: CalendarDay, time_slot: String },

    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error("Reservation {id} is cancelled and cannot be confirmed again")]
    InvalidTransition { id: String },

    #[error("Storage read failed: {0}")]
    StorageRead(#[source] StoreError),

    #[error("Storage write failed: {0}")]
    StorageWrite(#[source] StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        if err.is_read() {
            BookingError::StorageRead(err)
        } else {
            BookingError::StorageWrite(err)
        }
    }
}

impl BookingError {
    /// Storage faults are server-side; everything else is the caller's to fix.
    pub fn is_storage(&self) -> bool {
        matches!(self, BookingError::StorageRead(_) | BookingError::StorageWrite(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
