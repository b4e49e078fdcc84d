use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use slotbook_core::models::{LocalSlot, Period, SlotFilter};
use std::sync::Arc;

use crate::{ApiState, middleware::error_handling::AppError};

/// `GET /api/slots?date=2026-10-19&period=morning&available=true`
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    /// Local calendar date
    pub date: NaiveDate,

    pub period: Option<Period>,

    /// Only slots that can still be booked
    #[serde(default)]
    pub available: bool,
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Vec<LocalSlot>>, AppError> {
    let filter = SlotFilter {
        period: query.period,
        available_only: query.available,
    };
    Ok(Json(state.query.list_local(query.date, filter).await?))
}
