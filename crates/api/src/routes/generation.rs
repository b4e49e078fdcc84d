use axum::{Router, routing::post};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/generation", post(handlers::generation::generate_days))
        .route(
            "/api/generation/:date",
            post(handlers::generation::generate_date),
        )
}
