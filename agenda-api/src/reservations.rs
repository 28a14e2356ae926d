use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use agenda_domain::{
    CalendarDay, CreateReservationRequest, Reservation, ReservationStatus, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{AppError, AppJson};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/agendamentos",
            get(list_reservations).post(create_reservation),
        )
        .route("/api/agendamentos/data/{date}", get(list_by_date))
        .route("/api/agendamentos/ocupados/{date}", get(occupied_slots))
        .route("/api/agendamentos/{id}/status", put(update_status))
        .route("/api/agendamentos/{id}", delete(cancel_reservation))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/agendamentos
pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.bookings.list_all().await?))
}

/// GET /api/agendamentos/data/{date}
/// Every reservation on the day, cancelled ones included
pub async fn list_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let date: CalendarDay = date.parse()?;
    Ok(Json(state.bookings.list_by_date(&date).await?))
}

/// GET /api/agendamentos/ocupados/{date}
pub async fn occupied_slots(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let date: CalendarDay = date.parse()?;
    Ok(Json(state.bookings.occupied_slots(&date).await?))
}

/// POST /api/agendamentos
pub async fn create_reservation(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = state.bookings.create(&req).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// PUT /api/agendamentos/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> Result<Json<Reservation>, AppError> {
    let status: ReservationStatus = match req.status {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("status").into()),
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(ValidationError::InvalidStatus(other.to_string()).into()),
    };

    let reservation = state.bookings.update_status(&id, status).await?;
    Ok(Json(reservation))
}

/// DELETE /api/agendamentos/{id}
/// Soft cancel: the record stays, the slot is released
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let reservation = state.bookings.cancel(&id).await?;
    info!("Reservation cancelled: {}", reservation.id);

    Ok(Json(MessageResponse {
        message: "Reservation cancelled".to_string(),
    }))
}
