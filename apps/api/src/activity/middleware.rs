use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::activity::{LogChannel, LogLevel};
use crate::state::AppState;

/// Records every request on the `api` channel once its response is ready.
/// Server errors are logged as `ERROR`, client errors as `WARNING`.
pub async fn record_api_calls(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let level = if status.is_server_error() {
        LogLevel::Error
    } else if status.is_client_error() {
        LogLevel::Warning
    } else {
        LogLevel::Info
    };

    state.activity.record(
        LogChannel::Api,
        level,
        format!("{method} {path} {}", status.as_u16()),
        json!({
            "method": method,
            "path": path,
            "status_code": status.as_u16(),
            "duration_ms": started.elapsed().as_secs_f64() * 1000.0,
        }),
    );
    response
}
