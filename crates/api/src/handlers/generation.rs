use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use slotbook_core::errors::BookingError;
use slotbook_core::generator::{GeneratedDay, GenerationSummary};
use std::sync::Arc;

use crate::{ApiState, middleware::error_handling::AppError};

/// Upper bound for one manual run.
pub const MAX_GENERATION_DAYS: u32 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Defaults to the configured horizon
    pub days: Option<u32>,
}

#[axum::debug_handler]
pub async fn generate_days(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerationSummary>, AppError> {
    let days = payload.days.unwrap_or(state.generation_days);
    if days == 0 || days > MAX_GENERATION_DAYS {
        return Err(AppError(BookingError::Validation(format!(
            "days must be between 1 and {MAX_GENERATION_DAYS}, got {days}"
        ))));
    }

    Ok(Json(state.generator.generate_days(days).await))
}

#[axum::debug_handler]
pub async fn generate_date(
    State(state): State<Arc<ApiState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<GeneratedDay>, AppError> {
    Ok(Json(state.generator.generate_for_date(date).await?))
}
