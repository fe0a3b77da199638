use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ErrorRecord, GenericResponse, HistoryQuery, HistoryStats};

use super::super::state::AppState;

/// Persisted error history, newest first, with optional filters.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ErrorRecord>>> {
    Ok(Json(state.history.query(&query).await))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenericResponse>> {
    state.history.clear().await;
    tracing::info!("Error history cleared");
    Ok(Json(GenericResponse {
        status: "cleared".to_string(),
    }))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<HistoryStats>> {
    Ok(Json(state.history.stats().await))
}
