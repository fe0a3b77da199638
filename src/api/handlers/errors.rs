use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    AcceptedResponse, AttachScreenshotRequest, CurlResponse, ErrorRecord, ErrorSignal,
    GenericResponse,
};

use super::super::state::AppState;

/// Report an error trigger for a session. Processing is asynchronous:
/// the signal goes through the hub and the pipeline picks it up.
pub async fn report_error(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(signal): Json<ErrorSignal>,
) -> Result<Json<AcceptedResponse>> {
    if !state.sessions.contains_key(&session_id) {
        return Err(AppError::SessionNotFound(session_id));
    }

    state.hub.emit(session_id, signal);

    Ok(Json(AcceptedResponse { accepted: true }))
}

/// Errors captured during this session, newest last.
pub async fn list_session_errors(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ErrorRecord>>> {
    let session = state
        .sessions
        .get(&session_id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    let errors = session.errors.lock().await.clone();
    Ok(Json(errors))
}

pub async fn attach_screenshot(
    State(state): State<Arc<AppState>>,
    Path(error_id): Path<String>,
    Json(request): Json<AttachScreenshotRequest>,
) -> Result<Json<GenericResponse>> {
    if !request.data_url.starts_with("data:image/") {
        return Err(AppError::ValidationError(
            "data_url must be an image data URI".to_string(),
        ));
    }

    if !state
        .pipeline
        .attach_screenshot(&error_id, &request.data_url)
        .await
    {
        return Err(AppError::ErrorNotFound(error_id));
    }

    Ok(Json(GenericResponse {
        status: "attached".to_string(),
    }))
}

/// cURL reconstruction of a failed request, for pasting into a terminal.
pub async fn get_curl(
    State(state): State<Arc<AppState>>,
    Path(error_id): Path<String>,
) -> Result<Json<CurlResponse>> {
    let record = state
        .history
        .find(&error_id)
        .await
        .ok_or_else(|| AppError::ErrorNotFound(error_id.clone()))?;

    let details = record.details.as_ref().ok_or_else(|| {
        AppError::ValidationError("error has no network request details".to_string())
    })?;

    Ok(Json(CurlResponse {
        error_id,
        curl: details.curl_command(&record.tab_url),
    }))
}
