use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Settings, UpdateSettingsRequest};
use crate::storage::persist_settings;

use super::super::state::AppState;

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>> {
    Ok(Json(state.settings.read().await.clone()))
}

/// Replace the settings wholesale; absent fields fall back to defaults.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>> {
    let mut guard = state.settings.write().await;
    *guard = request.settings;
    persist_settings(&state.flush, &guard);
    tracing::info!("Settings updated (enabled: {})", guard.enabled);
    Ok(Json(guard.clone()))
}
