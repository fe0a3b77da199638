//! Per-page capture context.
//!
//! What the extension kept as page-global mutable state (the action buffer
//! and the current-tab error list) lives here as an explicit struct with a
//! lifecycle: created when a page attaches, dropped on detach.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CaptureConfig;
use crate::models::{ErrorRecord, RawEvent};
use crate::storage::FlushHandle;

use super::recorder::ActionRecorder;

pub struct CaptureSession {
    pub id: String,
    pub tab_url: String,
    pub domain: String,
    pub started_at: DateTime<Utc>,
    /// Mutated only by handler-serialized event ingestion, mirroring the
    /// page's single-threaded model.
    pub recorder: Mutex<ActionRecorder>,
    /// Current-tab error list, separate from the persisted history.
    pub errors: Mutex<Vec<ErrorRecord>>,
}

impl CaptureSession {
    pub fn new(tab_url: String, config: CaptureConfig, flush: Option<FlushHandle>) -> Self {
        let id = Uuid::new_v4().to_string();
        let mirror = flush.map(|f| (f, format!("recentActions:{}", id)));
        Self {
            domain: hostname_of(&tab_url).to_string(),
            tab_url,
            started_at: Utc::now(),
            recorder: Mutex::new(ActionRecorder::new(config, mirror)),
            errors: Mutex::new(Vec::new()),
            id,
        }
    }

    pub async fn record_event(&self, event: RawEvent) {
        self.recorder.lock().await.record(event);
    }

    pub async fn action_count(&self) -> usize {
        self.recorder.lock().await.len()
    }

    pub async fn error_count(&self) -> usize {
        self.errors.lock().await.len()
    }
}

/// Hostname portion of a URL, best-effort (no port, no path).
pub fn hostname_of(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let host = rest.split('/').next().unwrap_or(rest);
    host.split(':').next().unwrap_or(host)
}
