use serde::{Deserialize, Serialize};

use super::action::ActionKind;
use super::element::RawElement;

/// Raw interaction/network lifecycle event pushed by the page script.
/// Everything except `type` is optional: malformed or partial payloads are
/// tolerated and defaulted downstream, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Unix milliseconds; 0 or absent means "stamp on arrival".
    #[serde(default)]
    pub timestamp: i64,
    /// Page URL at event time.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<RawElement>,
    /// Current value for INPUT / RADIO_SELECT / SELECT_CHANGE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Selected option text for SELECT_CHANGE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request URL for XHR/FETCH events (distinct from the page `url`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Error text for FETCH_ERROR / WINDOW_ERROR / CONSOLE_ERROR_LOG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Destination for NAVIGATION.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_action: Option<String>,
}

impl RawEvent {
    pub fn new(kind: ActionKind, timestamp: i64, url: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            url: url.into(),
            element: None,
            value: None,
            checked: None,
            text: None,
            method: None,
            request_url: None,
            status: None,
            message: None,
            to: None,
            form_id: None,
            form_action: None,
        }
    }
}

/// Error trigger signal from the page script or the request observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSignal {
    ConsoleError {
        #[serde(default)]
        message: String,
        #[serde(default)]
        timestamp: i64,
    },
    WindowError {
        #[serde(default)]
        message: String,
        #[serde(default)]
        filename: String,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        col: u32,
        #[serde(default)]
        timestamp: i64,
    },
    UnhandledRejection {
        #[serde(default)]
        reason: String,
        #[serde(default)]
        timestamp: i64,
    },
    NetworkError {
        #[serde(default)]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        /// Missing or 0 means a non-HTTP network failure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource_type: Option<String>,
        #[serde(default)]
        timestamp: i64,
    },
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub tab_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachScreenshotRequest {
    /// Image data-URI produced by the privileged background capture.
    pub data_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Filter by error kind (wire name, e.g. "NETWORK_ERROR").
    #[serde(default)]
    pub kind: Option<String>,
    /// Only records at or after this Unix-ms timestamp.
    #[serde(default)]
    pub since: Option<i64>,
    /// Case-insensitive substring match on the message.
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(flatten)]
    pub settings: super::settings::Settings,
}
