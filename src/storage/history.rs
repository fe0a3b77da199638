//! Persisted error history: the most recent 1000 records, written as one
//! JSON blob on every append, exactly as the extension kept
//! `errorHistory` in extension storage.

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::models::{ErrorKind, ErrorRecord, HistoryQuery, HistoryStats};

use super::flush::FlushHandle;
use super::kv::KvStore;

pub const HISTORY_KEY: &str = "errorHistory";
/// Oldest records beyond this are dropped on append.
pub const MAX_HISTORY: usize = 1000;

pub struct HistoryStore {
    records: RwLock<Vec<ErrorRecord>>,
    flush: FlushHandle,
}

impl HistoryStore {
    /// Load the persisted blob; a corrupt or missing blob starts empty.
    pub async fn load(store: &dyn KvStore, flush: FlushHandle) -> Self {
        let records = match store.get(HISTORY_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<ErrorRecord>>(&blob) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Corrupt error history, starting fresh: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read error history: {}", e);
                Vec::new()
            }
        };

        tracing::info!("Error history loaded: {} records", records.len());
        Self {
            records: RwLock::new(records),
            flush,
        }
    }

    /// Append a record, apply the cap, persist the whole blob
    /// fire-and-forget.
    pub async fn append(&self, record: ErrorRecord) {
        let mut records = self.records.write().await;
        records.push(record);
        if records.len() > MAX_HISTORY {
            let excess = records.len() - MAX_HISTORY;
            records.drain(..excess);
        }
        self.persist(&records);
    }

    pub async fn all(&self) -> Vec<ErrorRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.clear();
        self.flush.remove(HISTORY_KEY);
    }

    pub async fn find(&self, error_id: &str) -> Option<ErrorRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == error_id)
            .cloned()
    }

    /// The single allowed mutation of a persisted record: screenshot
    /// attachment keyed by id. Returns whether a record matched.
    pub async fn attach_screenshot(&self, error_id: &str, data_url: &str) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.id == error_id) else {
            return false;
        };
        record.screenshot = Some(data_url.to_string());
        record.has_screenshot = true;
        self.persist(&records);
        true
    }

    /// Filtered view for the history viewer, newest first.
    pub async fn query(&self, query: &HistoryQuery) -> Vec<ErrorRecord> {
        let kind = query.kind.as_deref().and_then(parse_kind);
        let needle = query.q.as_ref().map(|q| q.to_lowercase());

        let records = self.records.read().await;
        let mut matched: Vec<ErrorRecord> = records
            .iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .filter(|r| query.since.map_or(true, |since| r.timestamp >= since))
            .filter(|r| {
                needle
                    .as_ref()
                    .map_or(true, |n| r.message.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    /// Popup counters.
    pub async fn stats(&self) -> HistoryStats {
        let records = self.records.read().await;
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();

        HistoryStats {
            total: records.len(),
            console_errors: records
                .iter()
                .filter(|r| r.kind == ErrorKind::ConsoleError)
                .count(),
            network_errors: records
                .iter()
                .filter(|r| r.kind == ErrorKind::NetworkError)
                .count(),
            today: records.iter().filter(|r| r.timestamp >= midnight).count(),
        }
    }

    fn persist(&self, records: &[ErrorRecord]) {
        match serde_json::to_string(records) {
            Ok(blob) => self.flush.set(HISTORY_KEY, blob),
            Err(e) => tracing::warn!("Could not serialize error history: {}", e),
        }
    }
}

fn parse_kind(raw: &str) -> Option<ErrorKind> {
    // Accept the wire names used everywhere else.
    #[derive(Deserialize)]
    struct Wrap(ErrorKind);
    serde_json::from_value::<Wrap>(serde_json::Value::String(raw.to_string()))
        .ok()
        .map(|w| w.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::flush::spawn_flush_task;
    use crate::storage::kv::MemoryStore;
    use std::sync::Arc;

    fn record(id: &str, kind: ErrorKind, timestamp: i64, message: &str) -> ErrorRecord {
        ErrorRecord {
            id: id.to_string(),
            kind,
            message: message.to_string(),
            timestamp,
            details: None,
            tab_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            reproduction_steps: String::new(),
            user_actions: Vec::new(),
            screenshot: None,
            has_screenshot: false,
        }
    }

    async fn fresh() -> (Arc<MemoryStore>, HistoryStore) {
        let store = Arc::new(MemoryStore::new());
        let flush = spawn_flush_task(store.clone());
        let history = HistoryStore::load(store.as_ref(), flush).await;
        (store, history)
    }

    #[tokio::test]
    async fn append_persists_whole_blob() {
        let (store, history) = fresh().await;
        history
            .append(record("e1", ErrorKind::ConsoleError, 1000, "boom"))
            .await;
        history.flush.flush().await;

        let blob = store.get(HISTORY_KEY).await.unwrap().unwrap();
        let persisted: Vec<ErrorRecord> = serde_json::from_str(&blob).unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, "e1");
    }

    #[tokio::test]
    async fn cap_keeps_most_recent_1000() {
        let (store, history) = fresh().await;
        for i in 0..1500 {
            history
                .append(record(
                    &format!("e{}", i),
                    ErrorKind::NetworkError,
                    i,
                    "HTTP 500",
                ))
                .await;
        }
        history.flush.flush().await;

        assert_eq!(history.len().await, 1000);
        let all = history.all().await;
        assert_eq!(all.first().unwrap().id, "e500");
        assert_eq!(all.last().unwrap().id, "e1499");

        let blob = store.get(HISTORY_KEY).await.unwrap().unwrap();
        let persisted: Vec<ErrorRecord> = serde_json::from_str(&blob).unwrap();
        assert_eq!(persisted.len(), 1000);
        assert_eq!(persisted.first().unwrap().id, "e500");
    }

    #[tokio::test]
    async fn screenshot_attach_touches_only_the_matching_record() {
        let (_store, history) = fresh().await;
        history
            .append(record("a", ErrorKind::ConsoleError, 1000, "one"))
            .await;
        history
            .append(record("b", ErrorKind::ConsoleError, 2000, "two"))
            .await;

        let before = history.all().await;
        assert!(history.attach_screenshot("b", "data:image/png;base64,xyz").await);

        let after = history.all().await;
        assert_eq!(
            serde_json::to_string(&after[0]).unwrap(),
            serde_json::to_string(&before[0]).unwrap()
        );
        assert!(after[1].has_screenshot);
        assert_eq!(after[1].screenshot.as_deref(), Some("data:image/png;base64,xyz"));

        assert!(!history.attach_screenshot("missing", "data:").await);
    }

    #[tokio::test]
    async fn query_filters_by_kind_time_and_text() {
        let (_store, history) = fresh().await;
        history
            .append(record("a", ErrorKind::ConsoleError, 1000, "TypeError: x is null"))
            .await;
        history
            .append(record("b", ErrorKind::NetworkError, 2000, "Ошибка Network: HTTP 404"))
            .await;
        history
            .append(record("c", ErrorKind::NetworkError, 3000, "Ошибка Network: HTTP 500"))
            .await;

        let network = history
            .query(&HistoryQuery {
                kind: Some("NETWORK_ERROR".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(network.len(), 2);
        // Newest first.
        assert_eq!(network[0].id, "c");

        let recent = history
            .query(&HistoryQuery {
                since: Some(2500),
                ..Default::default()
            })
            .await;
        assert_eq!(recent.len(), 1);

        let text = history
            .query(&HistoryQuery {
                q: Some("typeerror".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].id, "a");
    }

    #[tokio::test]
    async fn reload_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let flush = spawn_flush_task(store.clone());
        let history = HistoryStore::load(store.as_ref(), flush.clone()).await;
        history
            .append(record("e1", ErrorKind::ConsoleError, 1000, "boom"))
            .await;
        flush.flush().await;

        let reloaded = HistoryStore::load(store.as_ref(), flush).await;
        assert_eq!(reloaded.len().await, 1);
        assert_eq!(reloaded.find("e1").await.unwrap().message, "boom");
    }
}
