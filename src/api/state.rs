use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};

use crate::capture::{CaptureSession, ErrorCapturePipeline, NotificationEvent, SignalHub};
use crate::config::Config;
use crate::models::Settings;
use crate::storage::{
    load_settings, spawn_flush_task, FlushHandle, HistoryStore, KvStore, SqliteStore,
};

/// Connected WebSocket client info.
#[derive(Debug)]
pub struct ConnectedClient {
    pub connected_at: Instant,
}

/// Shared application state.
pub struct AppState {
    pub config: Config,

    /// Attached page sessions: session_id -> capture context.
    pub sessions: Arc<DashMap<String, Arc<CaptureSession>>>,

    /// Ingestion-to-pipeline seam.
    pub hub: SignalHub,

    pub pipeline: Arc<ErrorCapturePipeline>,
    pub history: Arc<HistoryStore>,
    pub settings: Arc<RwLock<Settings>>,

    /// Background persistence queue.
    pub flush: FlushHandle,

    /// Broadcast channel feeding notification clients.
    pub notifier: broadcast::Sender<NotificationEvent>,

    /// Connected WebSocket clients: client_id -> client info.
    pub connected_clients: DashMap<String, ConnectedClient>,
}

impl AppState {
    /// Open the configured SQLite store and build the full state.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn KvStore> = match &config.db_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(SqliteStore::open_default()?),
        };
        Ok(Self::with_store(config, store).await)
    }

    /// Build the state on top of an arbitrary store (tests use the
    /// in-memory one).
    pub async fn with_store(config: Config, store: Arc<dyn KvStore>) -> Arc<Self> {
        let flush = spawn_flush_task(store.clone());
        let history = Arc::new(HistoryStore::load(store.as_ref(), flush.clone()).await);
        let settings = Arc::new(RwLock::new(load_settings(store.as_ref()).await));
        let sessions: Arc<DashMap<String, Arc<CaptureSession>>> = Arc::new(DashMap::new());
        let (notifier, _) = broadcast::channel(1024);
        let hub = SignalHub::new();

        let pipeline = Arc::new(ErrorCapturePipeline::new(
            Arc::clone(&sessions),
            Arc::clone(&history),
            Arc::clone(&settings),
            notifier.clone(),
            config.capture.clone(),
        ));
        pipeline.spawn_listener(&hub);

        Arc::new(Self {
            config,
            sessions,
            hub,
            pipeline,
            history,
            settings,
            flush,
            notifier,
            connected_clients: DashMap::new(),
        })
    }

    pub fn broadcast(&self, event: NotificationEvent) {
        // Ignore send errors (no receivers).
        let _ = self.notifier.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notifier.subscribe()
    }

    /// Create and register a capture session for a page attachment.
    pub fn attach_session(&self, tab_url: String) -> Arc<CaptureSession> {
        let session = Arc::new(CaptureSession::new(
            tab_url,
            self.config.capture.clone(),
            Some(self.flush.clone()),
        ));
        self.sessions.insert(session.id.clone(), Arc::clone(&session));
        tracing::info!("Session attached: {} ({})", session.id, session.domain);
        session
    }

    /// Tear a session down, draining pending writes so a detach right
    /// after an error does not lose the last history append.
    pub async fn detach_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            self.flush.flush().await;
            tracing::info!("Session detached: {}", session_id);
        }
        removed
    }

    pub fn client_connected(&self, client_id: &str) {
        self.connected_clients.insert(
            client_id.to_string(),
            ConnectedClient {
                connected_at: Instant::now(),
            },
        );
        tracing::debug!(
            "Client {} connected (active: {})",
            client_id,
            self.connected_clients.len()
        );
    }

    pub fn client_disconnected(&self, client_id: &str) {
        if let Some((_, client)) = self.connected_clients.remove(client_id) {
            tracing::debug!(
                "Client {} disconnected after {:?} (active: {})",
                client_id,
                client.connected_at.elapsed(),
                self.connected_clients.len()
            );
        }
    }
}
