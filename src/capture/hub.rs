//! The observable seam between signal ingestion and the capture pipeline.
//!
//! The extension observed errors by wrapping platform primitives in place;
//! here every ingestion path publishes into one broadcast channel and the
//! pipeline consumes it as a stream, so "observe every error signal" is a
//! subscription instead of a global patch.

use tokio::sync::broadcast;

use crate::models::ErrorSignal;

#[derive(Debug, Clone)]
pub struct SessionSignal {
    pub session_id: String,
    pub signal: ErrorSignal,
}

#[derive(Clone)]
pub struct SignalHub {
    tx: broadcast::Sender<SessionSignal>,
}

impl SignalHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish a signal. No subscriber is not an error: signals raised
    /// before the pipeline attaches are simply dropped.
    pub fn emit(&self, session_id: impl Into<String>, signal: ErrorSignal) {
        let _ = self.tx.send(SessionSignal {
            session_id: session_id.into(),
            signal,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}
