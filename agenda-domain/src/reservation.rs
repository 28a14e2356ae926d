use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CalendarDay, NewReservation, ValidationError};

/// Opaque reservation identifier, unique across all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReservationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ReservationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reservation status. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[serde(alias = "confirmado")]
    Confirmed,
    #[serde(alias = "cancelado")]
    Cancelled,
}

impl ReservationStatus {
    /// Only confirmed reservations occupy their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" | "confirmado" => Ok(ReservationStatus::Confirmed),
            "cancelled" | "cancelado" => Ok(ReservationStatus::Cancelled),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// A booked (date, time slot) for one customer.
///
/// Records are never deleted; cancellation only flips `status`, so the
/// record stays for history but stops occupying its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    #[serde(alias = "nome")]
    pub customer_name: String,
    #[serde(alias = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(alias = "servico")]
    pub service_type: String,
    #[serde(alias = "data")]
    pub date: CalendarDay,
    #[serde(alias = "horario")]
    pub time_slot: String,
    #[serde(alias = "valor")]
    pub amount: Decimal,
    pub status: ReservationStatus,
    #[serde(alias = "dataCriacao")]
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Admit a validated request as a fresh confirmed reservation.
    pub fn new(request: NewReservation) -> Self {
        Self {
            id: ReservationId::new(),
            customer_name: request.customer_name,
            phone: request.phone,
            email: request.email,
            service_type: request.service_type,
            date: request.date,
            time_slot: request.time_slot,
            amount: request.amount,
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    /// True when this record holds the given slot.
    pub fn occupies(&self, date: &CalendarDay, time_slot: &str) -> bool {
        self.status.is_active() && self.date == *date && self.time_slot == time_slot
    }

    pub fn set_status(&mut self, status: ReservationStatus) {
        self.status = status;
    }

    pub fn cancel(&mut self) {
        self.set_status(ReservationStatus::Cancelled);
    }
}
