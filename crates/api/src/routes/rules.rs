use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/rules",
            get(handlers::rules::list_rules).post(handlers::rules::create_rule),
        )
        .route(
            "/api/rules/:id",
            get(handlers::rules::get_rule)
                .put(handlers::rules::update_rule)
                .delete(handlers::rules::delete_rule),
        )
        .route("/api/weekdays", get(handlers::rules::list_weekdays))
        .route(
            "/api/weekdays/:day/next",
            get(handlers::rules::next_day_for_weekday),
        )
}
