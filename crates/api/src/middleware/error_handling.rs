//! # Error Handling Middleware
//!
//! Maps [`BookingError`] to HTTP status codes and a JSON body of the form
//! `{"error": "..."}`. Clients only ever see the short public message; the
//! full error is logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use slotbook_core::errors::BookingError;
use tracing::{debug, error};

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use slotbook_api::middleware::error_handling::AppError;
/// use slotbook_core::errors::BookingError;
///
/// async fn handler(day: u8) -> Result<Json<u8>, AppError> {
///     if day > 6 {
///         return Err(AppError(BookingError::Validation("day out of range".to_string())));
///     }
///     Ok(Json(day))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable(_) => StatusCode::CONFLICT,
            BookingError::Persistence(_)
            | BookingError::Notification(_)
            | BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        let body = Json(json!({ "error": self.0.public_message() }));
        (status, body).into_response()
    }
}

/// Allows `?` on service calls inside handlers.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Persistence(err))
    }
}

/// Maps a BookingError straight to a response
pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
