//! # Reservation Handlers
//!
//! `POST /api/slots/:id/reservations` is the booking action. A slot that was
//! taken in the meantime answers `409 Conflict`; the client is expected to
//! refresh its list and let the patient pick again.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use slotbook_core::models::{Reservation, ReserveRequest};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    pub user_id: String,
}

#[axum::debug_handler]
pub async fn reserve_slot(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = state
        .coordinator
        .reserve(slot_id, &payload.user_id, &payload.user_name)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

#[axum::debug_handler]
pub async fn get_reservation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.coordinator.get_reservation(id).await?))
}

#[axum::debug_handler]
pub async fn list_reservations(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(
        state.coordinator.reservations_for_user(&query.user_id).await?,
    ))
}
