pub mod flush;
pub mod history;
pub mod kv;

pub use flush::{spawn_flush_task, FlushHandle};
pub use history::{HistoryStore, HISTORY_KEY, MAX_HISTORY};
pub use kv::{KvStore, MemoryStore, SqliteStore};

use crate::models::Settings;

pub const SETTINGS_KEY: &str = "settings";

/// Read persisted settings; missing or corrupt settings fall back to
/// defaults.
pub async fn load_settings(store: &dyn KvStore) -> Settings {
    match store.get(SETTINGS_KEY).await {
        Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
            tracing::warn!("Corrupt settings, using defaults: {}", e);
            Settings::default()
        }),
        Ok(None) => Settings::default(),
        Err(e) => {
            tracing::warn!("Could not read settings: {}", e);
            Settings::default()
        }
    }
}

/// Queue a settings write through the flush task.
pub fn persist_settings(flush: &FlushHandle, settings: &Settings) {
    match serde_json::to_string(settings) {
        Ok(blob) => flush.set(SETTINGS_KEY, blob),
        Err(e) => tracing::warn!("Could not serialize settings: {}", e),
    }
}
