use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    CreateSessionRequest, GenericResponse, SessionCreatedResponse, SessionStatusResponse,
};

use super::super::state::AppState;

/// Register a page attachment. One session per tab lifetime; the page
/// script reattaches after navigation with the new URL.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionCreatedResponse>> {
    if request.tab_url.is_empty() {
        return Err(AppError::ValidationError("tab_url is required".to_string()));
    }

    let session = state.attach_session(request.tab_url);

    Ok(Json(SessionCreatedResponse {
        session_id: session.id.clone(),
        tab_url: session.tab_url.clone(),
        domain: session.domain.clone(),
    }))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>> {
    let session = state
        .sessions
        .get(&session_id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        tab_url: session.tab_url.clone(),
        started_at: session.started_at.to_rfc3339(),
        action_count: session.action_count().await,
        error_count: session.error_count().await,
    }))
}

pub async fn detach_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<GenericResponse>> {
    if !state.detach_session(&session_id).await {
        return Err(AppError::SessionNotFound(session_id));
    }
    Ok(Json(GenericResponse {
        status: "detached".to_string(),
    }))
}
