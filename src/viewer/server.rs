//! JSON HTTP API over parsed sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use super::sessions::Sessions;

#[derive(Serialize)]
struct SessionsSummary {
    length: usize,
}

/// Build the viewer router over a loaded session list.
///
/// Routes: `GET /sessions` returns the session count;
/// `GET /sessions/{index}` returns one session or 404.
pub fn router(sessions: Arc<Sessions>) -> Router {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{index}", get(session_by_index))
        .with_state(sessions)
}

async fn list_sessions(State(sessions): State<Arc<Sessions>>) -> Json<SessionsSummary> {
    Json(SessionsSummary {
        length: sessions.len(),
    })
}

async fn session_by_index(
    State(sessions): State<Arc<Sessions>>,
    Path(index): Path<usize>,
) -> Response {
    match sessions.get(index) {
        Some(session) => Json(session).into_response(),
        None => {
            debug!(index, "session not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
