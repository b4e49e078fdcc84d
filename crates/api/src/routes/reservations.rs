use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/slots/:id/reservations",
            post(handlers::reservations::reserve_slot),
        )
        .route(
            "/api/reservations",
            get(handlers::reservations::list_reservations),
        )
        .route(
            "/api/reservations/:id",
            get(handlers::reservations::get_reservation),
        )
}
