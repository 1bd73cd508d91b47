pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::activity::{handlers as activity_handlers, middleware::record_api_calls};
use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analyze-jd", post(handlers::handle_analyze_jd))
        .route("/generate-questions", post(handlers::handle_generate_questions))
        .route("/evaluate-answer", post(handlers::handle_evaluate_answer))
        .route("/generate-answer", post(handlers::handle_generate_answer))
        .route(
            "/generate-answer-stream",
            post(handlers::handle_generate_answer_stream),
        )
        .route("/debug-question/:id", get(handlers::handle_debug_question))
        .route("/logs/:log_type", get(activity_handlers::handle_get_logs));

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_api_calls,
        ))
        .with_state(state)
}
