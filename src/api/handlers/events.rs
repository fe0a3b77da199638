use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AcceptedResponse, RawEvent};

use super::super::state::AppState;

/// Ingest one page interaction event into the session's action buffer.
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(event): Json<RawEvent>,
) -> Result<Json<AcceptedResponse>> {
    let session = state
        .sessions
        .get(&session_id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    session.record_event(event).await;

    Ok(Json(AcceptedResponse { accepted: true }))
}
