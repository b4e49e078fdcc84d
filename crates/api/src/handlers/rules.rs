//! # Availability Rule Handlers
//!
//! Administrative CRUD over the recurring weekly rules, plus the two
//! weekday lookups the booking client starts from.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use slotbook_core::models::{
    AvailabilityRule, DayOfWeek, DaySchedule, NewAvailabilityRule, UpdateAvailabilityRule,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn list_rules(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<AvailabilityRule>>, AppError> {
    Ok(Json(state.rules.list_all().await?))
}

#[axum::debug_handler]
pub async fn create_rule(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<NewAvailabilityRule>,
) -> Result<(StatusCode, Json<AvailabilityRule>), AppError> {
    let rule = state.rules.create(payload).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

#[axum::debug_handler]
pub async fn get_rule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityRule>, AppError> {
    Ok(Json(state.rules.get(id).await?))
}

#[axum::debug_handler]
pub async fn update_rule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRule>,
) -> Result<Json<AvailabilityRule>, AppError> {
    Ok(Json(state.rules.update(id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_rule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.rules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Weekdays (0 = Sunday) that currently have at least one active rule.
#[axum::debug_handler]
pub async fn list_weekdays(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<DayOfWeek>>, AppError> {
    Ok(Json(state.query.list_available_weekdays().await?))
}

/// Slots on the next date, today included, that falls on `day`.
#[axum::debug_handler]
pub async fn next_day_for_weekday(
    State(state): State<Arc<ApiState>>,
    Path(day): Path<u8>,
) -> Result<Json<DaySchedule>, AppError> {
    let day = DayOfWeek::new(day)?;
    Ok(Json(state.query.next_day_for_weekday(day).await?))
}
