pub mod dto;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use rest::{
    create_topic_handler, current_plan_handler, delete_topic_handler, generate_plan_handler,
    get_topic_handler, list_topics_handler, plan_stats_handler, sessions_for_date_handler,
    set_session_status_handler, set_topic_status_handler, syllabus_summary_handler,
    update_topic_handler,
};
use state::AppState;

/// Builds the API routes. Cross-cutting layers (CORS, tracing, Swagger UI) are added
/// by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/topics", get(list_topics_handler).post(create_topic_handler))
        .route("/topics/summary", get(syllabus_summary_handler))
        .route(
            "/topics/{topic_id}",
            get(get_topic_handler)
                .put(update_topic_handler)
                .delete(delete_topic_handler),
        )
        .route("/topics/{topic_id}/status", patch(set_topic_status_handler))
        .route("/plans", post(generate_plan_handler))
        .route("/plans/current", get(current_plan_handler))
        .route("/plans/current/sessions", get(sessions_for_date_handler))
        .route("/plans/current/stats", get(plan_stats_handler))
        .route(
            "/plans/{plan_id}/sessions/{session_id}",
            patch(set_session_status_handler),
        )
        .with_state(app_state)
}
