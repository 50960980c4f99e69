use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, security_headers_layers};
use crate::handlers::{
    active_events, attendance_status, automatic_check_in, current_token, health_check,
    manual_check_in, AppState,
};

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/events/active", get(active_events))
        .route("/events/:event_id/check-in", post(automatic_check_in))
        .route("/events/:event_id/check-in/manual", post(manual_check_in))
        .route("/events/:event_id/check-in/status", get(attendance_status))
        .route("/check-in/token", get(current_token))
        .with_state(state);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer());

    for layer in security_headers_layers() {
        router = router.layer(layer);
    }

    router
}
