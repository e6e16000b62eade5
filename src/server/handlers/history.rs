use crate::{
    error::{ProxyError, Result},
    history::{HistoryRecord, NewHistoryRecord},
    server::state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

/// Recently played streams, newest first
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    Json(state.history.list().await)
}

/// Record a played stream
pub async fn create_history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewHistoryRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<HistoryRecord>)> {
    let Json(entry) = payload.map_err(|rejection| ProxyError::Validation {
        field: "body",
        message: rejection.body_text(),
    })?;

    let record = state.history.create(entry.validated()?).await;
    info!("Recorded history entry {} for {}", record.id, record.url);

    Ok((StatusCode::CREATED, Json(record)))
}

/// Forget every recorded stream
pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.history.clear().await;
    info!("History cleared");
    StatusCode::NO_CONTENT
}
