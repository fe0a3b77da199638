//! Action Recorder: normalizes live interaction/network signals into
//! `ActionRecord`s and maintains the bounded, episode-windowed buffer.

use chrono::Utc;

use crate::config::CaptureConfig;
use crate::models::{ActionDetail, ActionRecord, ElementDescriptor, RawEvent};
use crate::storage::FlushHandle;

use super::descriptor;

/// Hard cap on buffered actions; oldest entries drop first.
pub const MAX_BUFFER: usize = 30;
/// How many trailing records are mirrored for cross-script inspection.
pub const MIRROR_LEN: usize = 15;

pub struct ActionRecorder {
    buffer: Vec<ActionRecord>,
    config: CaptureConfig,
    /// Secondary readable store target; best-effort, failures swallowed.
    mirror: Option<(FlushHandle, String)>,
}

impl ActionRecorder {
    pub fn new(config: CaptureConfig, mirror: Option<(FlushHandle, String)>) -> Self {
        Self {
            buffer: Vec::new(),
            config,
            mirror,
        }
    }

    /// Record one raw event. Never fails: malformed payloads are defaulted
    /// and descriptor extraction degrades to a minimal descriptor.
    pub fn record(&mut self, event: RawEvent) {
        let record = self.build_record(event);

        // A gap beyond the episode timeout starts a new interaction
        // episode; the stale buffer is discarded wholesale.
        if let Some(last) = self.buffer.last() {
            if record.timestamp - last.timestamp > self.config.action_timeout_ms {
                self.buffer.clear();
            }
        }

        self.buffer.push(record);
        if self.buffer.len() > MAX_BUFFER {
            let excess = self.buffer.len() - MAX_BUFFER;
            self.buffer.drain(..excess);
        }

        self.mirror_recent();
    }

    /// Read-only view of the buffered actions, oldest first.
    pub fn actions(&self) -> &[ActionRecord] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn build_record(&self, event: RawEvent) -> ActionRecord {
        let element = event.element.as_ref().map(descriptor::describe);

        let mut timestamp = if event.timestamp > 0 {
            event.timestamp
        } else {
            Utc::now().timestamp_millis()
        };
        // Buffer invariant: non-decreasing timestamps even under clock skew.
        if let Some(last) = self.buffer.last() {
            if timestamp < last.timestamp {
                timestamp = last.timestamp;
            }
        }

        let detail = classify(&event, element.as_ref());

        ActionRecord {
            detail,
            timestamp,
            url: event.url,
            element,
        }
    }

    fn mirror_recent(&self) {
        let Some((flush, key)) = &self.mirror else {
            return;
        };
        let start = self.buffer.len().saturating_sub(MIRROR_LEN);
        match serde_json::to_string(&self.buffer[start..]) {
            Ok(blob) => flush.set(key.clone(), blob),
            Err(e) => tracing::debug!("Skipping action mirror: {}", e),
        }
    }
}

/// Map a tolerated-possibly-partial wire event onto the closed action sum
/// type, substituting defaults for whatever is missing.
fn classify(event: &RawEvent, element: Option<&ElementDescriptor>) -> ActionDetail {
    use crate::models::ActionKind as K;

    let value = || {
        // Input values echo the descriptor redaction for password fields.
        let raw = event
            .value
            .clone()
            .or_else(|| element.and_then(|e| e.value.clone()))
            .unwrap_or_default();
        if element.map(|e| e.input_type.as_deref() == Some("password")).unwrap_or(false) {
            format!("***{} chars***", raw.chars().count())
        } else {
            raw
        }
    };
    let method = || {
        event
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("GET")
            .to_uppercase()
    };
    let message = |fallback: &str| {
        event
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    match event.kind {
        K::Click => ActionDetail::Click,
        K::Input => ActionDetail::Input { value: value() },
        K::Focus => ActionDetail::Focus,
        K::CheckboxToggle => ActionDetail::CheckboxToggle {
            checked: event
                .checked
                .or_else(|| element.and_then(|e| e.checked))
                .unwrap_or(false),
        },
        K::RadioSelect => ActionDetail::RadioSelect { value: value() },
        K::SelectChange => ActionDetail::SelectChange {
            value: value(),
            text: event.text.clone(),
        },
        K::FormSubmit => ActionDetail::FormSubmit {
            form_id: event.form_id.clone(),
            action: event.form_action.clone(),
        },
        K::Navigation => ActionDetail::Navigation {
            to: event.to.clone().unwrap_or_else(|| event.url.clone()),
        },
        K::XhrRequest => ActionDetail::XhrRequest {
            method: method(),
            url: event.request_url.clone().unwrap_or_default(),
        },
        K::XhrResponse => ActionDetail::XhrResponse {
            status: event.status.unwrap_or(0),
        },
        K::FetchRequest => ActionDetail::FetchRequest {
            method: method(),
            url: event.request_url.clone().unwrap_or_default(),
        },
        K::FetchResponse => ActionDetail::FetchResponse {
            status: event.status.unwrap_or(0),
        },
        K::FetchError => ActionDetail::FetchError {
            message: message("network error"),
        },
        K::WindowError => ActionDetail::WindowError {
            message: message(""),
        },
        K::ConsoleErrorLog => ActionDetail::ConsoleErrorLog {
            message: message(""),
        },
    }
}
