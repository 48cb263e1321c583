pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use rest::{
    create_session_handler, generate_question_handler, get_leaderboard_handler,
    get_session_handler, get_settings_handler, get_streak_handler, list_sessions_handler,
    recommendation_handler, record_play_handler, save_settings_handler, submit_score_handler,
    update_session_handler,
};
use state::AppState;

pub use middleware::trace_requests;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/questions", post(generate_question_handler))
        .route(
            "/sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route(
            "/sessions/{id}",
            get(get_session_handler).put(update_session_handler),
        )
        .route("/recommendation", get(recommendation_handler))
        .route(
            "/settings",
            get(get_settings_handler).put(save_settings_handler),
        )
        .route("/streak", get(get_streak_handler).post(record_play_handler))
        .route("/leaderboard", post(submit_score_handler))
        .route("/leaderboard/{key}", get(get_leaderboard_handler))
        .layer(axum_middleware::from_fn(trace_requests))
        .with_state(app_state)
}
