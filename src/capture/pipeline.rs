//! Error Capture Pipeline: capture → enrichment → persistence →
//! notification, for every inbound error signal.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::CaptureConfig;
use crate::models::{
    ErrorKind, ErrorRecord, ErrorSignal, NetworkDetails, NotificationPosition, Settings, Theme,
};
use crate::storage::HistoryStore;

use super::hub::SignalHub;
use super::session::CaptureSession;
use super::synthesizer;

/// How many raw actions ride along on the error record.
const MAX_ATTACHED_ACTIONS: usize = 20;

/// Display policy shipped with each notification; rendering is the
/// client's business.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DisplayPolicy {
    pub position: NotificationPosition,
    pub timeout_ms: u64,
    pub theme: Theme,
}

/// Events pushed to notification clients over the WebSocket.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    ErrorCaptured {
        session_id: String,
        record: ErrorRecord,
        display: DisplayPolicy,
    },
    /// Ask the privileged background client for a visible-tab capture.
    CaptureScreenshot {
        session_id: String,
        error_id: String,
    },
    ScreenshotAttached {
        error_id: String,
    },
    Pong,
}

pub struct ErrorCapturePipeline {
    sessions: Arc<DashMap<String, Arc<CaptureSession>>>,
    history: Arc<HistoryStore>,
    settings: Arc<RwLock<Settings>>,
    notifier: broadcast::Sender<NotificationEvent>,
    cancel: broadcast::Sender<()>,
    config: CaptureConfig,
}

impl ErrorCapturePipeline {
    pub fn new(
        sessions: Arc<DashMap<String, Arc<CaptureSession>>>,
        history: Arc<HistoryStore>,
        settings: Arc<RwLock<Settings>>,
        notifier: broadcast::Sender<NotificationEvent>,
        config: CaptureConfig,
    ) -> Self {
        let (cancel, _) = broadcast::channel(1);
        Self {
            sessions,
            history,
            settings,
            notifier,
            cancel,
            config,
        }
    }

    /// Consume the signal hub in a background task until shutdown.
    pub fn spawn_listener(self: &Arc<Self>, hub: &SignalHub) {
        let pipeline = Arc::clone(self);
        let mut rx = hub.subscribe();
        let mut cancel_rx = self.cancel.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_rx.recv() => {
                        tracing::info!("Capture pipeline listener cancelled");
                        break;
                    }
                    received = rx.recv() => {
                        match received {
                            Ok(signal) => {
                                pipeline.handle(&signal.session_id, signal.signal).await;
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                tracing::warn!("Capture pipeline lagged, {} signals lost", missed);
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
            tracing::debug!("Capture pipeline listener stopped");
        });
    }

    pub fn shutdown(&self) {
        let _ = self.cancel.send(());
    }

    /// Run one signal through the full pipeline. Returns the created
    /// record, or `None` for an unknown session.
    pub async fn handle(&self, session_id: &str, signal: ErrorSignal) -> Option<ErrorRecord> {
        let session = match self.sessions.get(session_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                tracing::warn!("Error signal for unknown session {}", session_id);
                return None;
            }
        };

        let (kind, message, details, timestamp) = normalize(signal);

        // Enrichment: correlate with the buffered actions.
        let (reproduction_steps, user_actions) = {
            let recorder = session.recorder.lock().await;
            let actions = recorder.actions();
            let steps = synthesizer::synthesize(actions, timestamp, &message, &self.config);
            let start = actions.len().saturating_sub(MAX_ATTACHED_ACTIONS);
            (steps, actions[start..].to_vec())
        };

        let record = ErrorRecord {
            id: ErrorRecord::new_id(timestamp),
            kind,
            message,
            timestamp,
            details,
            tab_url: session.tab_url.clone(),
            domain: session.domain.clone(),
            reproduction_steps,
            user_actions,
            screenshot: None,
            has_screenshot: false,
        };

        session.errors.lock().await.push(record.clone());
        self.history.append(record.clone()).await;

        tracing::info!(
            "Captured {:?} for {} ({} steps attached)",
            record.kind,
            record.domain,
            record.user_actions.len()
        );

        self.notify(&session.id, &record).await;

        Some(record)
    }

    /// Push the notification unless filters suppress it. Suppressed errors
    /// are still recorded; only display is gated.
    async fn notify(&self, session_id: &str, record: &ErrorRecord) {
        let settings = self.settings.read().await;
        if !settings.enabled {
            return;
        }
        if record.kind == ErrorKind::NetworkError {
            let status = record.details.as_ref().map(|d| d.status_code).unwrap_or(0);
            if !settings.status_allowed(status) {
                return;
            }
        }

        let _ = self.notifier.send(NotificationEvent::ErrorCaptured {
            session_id: session_id.to_string(),
            record: record.clone(),
            display: DisplayPolicy {
                position: settings.position,
                timeout_ms: settings.notification_timeout_ms,
                theme: settings.theme,
            },
        });

        if settings.screenshots_enabled {
            let _ = self.notifier.send(NotificationEvent::CaptureScreenshot {
                session_id: session_id.to_string(),
                error_id: record.id.clone(),
            });
        }
    }

    /// Attach a screenshot to the record with this id, in the persisted
    /// history and in whichever session list still holds it. The single
    /// allowed post-capture mutation.
    pub async fn attach_screenshot(&self, error_id: &str, data_url: &str) -> bool {
        let mut found = self.history.attach_screenshot(error_id, data_url).await;

        for entry in self.sessions.iter() {
            let mut errors = entry.value().errors.lock().await;
            if let Some(record) = errors.iter_mut().find(|r| r.id == error_id) {
                record.screenshot = Some(data_url.to_string());
                record.has_screenshot = true;
                found = true;
            }
        }

        if found {
            let _ = self.notifier.send(NotificationEvent::ScreenshotAttached {
                error_id: error_id.to_string(),
            });
        }
        found
    }
}

/// Fold a raw signal into (kind, message, details, timestamp); missing
/// fields get defaults rather than rejections.
fn normalize(signal: ErrorSignal) -> (ErrorKind, String, Option<NetworkDetails>, i64) {
    let now = || chrono::Utc::now().timestamp_millis();
    let stamp = |ts: i64| if ts > 0 { ts } else { now() };

    match signal {
        ErrorSignal::ConsoleError { message, timestamp } => {
            (ErrorKind::ConsoleError, message, None, stamp(timestamp))
        }
        ErrorSignal::WindowError {
            message,
            filename,
            line,
            col,
            timestamp,
        } => (
            ErrorKind::ConsoleError,
            format!("{} ({}:{}:{})", message, filename, line, col),
            None,
            stamp(timestamp),
        ),
        ErrorSignal::UnhandledRejection { reason, timestamp } => (
            ErrorKind::ConsoleError,
            format!("Unhandled promise rejection: {}", reason),
            None,
            stamp(timestamp),
        ),
        ErrorSignal::NetworkError {
            url,
            method,
            status_code,
            error,
            resource_type,
            timestamp,
        } => {
            let status_code = status_code.unwrap_or(0);
            let method = method
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "GET".to_string())
                .to_uppercase();
            let error_text = error.filter(|e| !e.is_empty()).unwrap_or_else(|| {
                if status_code >= 400 {
                    format!("HTTP {}", status_code)
                } else {
                    "network error".to_string()
                }
            });
            let message = format!("Ошибка Network: {} - {}", error_text, url);
            let details = NetworkDetails {
                url,
                method,
                status_code,
                error: error_text,
                resource_type,
            };
            (ErrorKind::NetworkError, message, Some(details), stamp(timestamp))
        }
    }
}
