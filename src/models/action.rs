use serde::{Deserialize, Serialize};

use super::element::ElementDescriptor;

/// Fieldless action tag, used on the wire and for filtering decisions.
/// Wire names match the string tags of the original extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Click,
    Input,
    Focus,
    CheckboxToggle,
    RadioSelect,
    SelectChange,
    FormSubmit,
    Navigation,
    XhrRequest,
    XhrResponse,
    FetchRequest,
    FetchResponse,
    FetchError,
    WindowError,
    ConsoleErrorLog,
}

/// Kind-specific payload of a recorded action. Closed sum type so the
/// grouper and synthesizer match exhaustively; adding a kind is a
/// compile-time-checked change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionDetail {
    Click,
    Input {
        value: String,
    },
    Focus,
    CheckboxToggle {
        checked: bool,
    },
    RadioSelect {
        value: String,
    },
    SelectChange {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    FormSubmit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        form_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
    Navigation {
        to: String,
    },
    XhrRequest {
        method: String,
        url: String,
    },
    XhrResponse {
        status: u16,
    },
    FetchRequest {
        method: String,
        url: String,
    },
    FetchResponse {
        status: u16,
    },
    FetchError {
        message: String,
    },
    WindowError {
        message: String,
    },
    ConsoleErrorLog {
        message: String,
    },
}

impl ActionDetail {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionDetail::Click => ActionKind::Click,
            ActionDetail::Input { .. } => ActionKind::Input,
            ActionDetail::Focus => ActionKind::Focus,
            ActionDetail::CheckboxToggle { .. } => ActionKind::CheckboxToggle,
            ActionDetail::RadioSelect { .. } => ActionKind::RadioSelect,
            ActionDetail::SelectChange { .. } => ActionKind::SelectChange,
            ActionDetail::FormSubmit { .. } => ActionKind::FormSubmit,
            ActionDetail::Navigation { .. } => ActionKind::Navigation,
            ActionDetail::XhrRequest { .. } => ActionKind::XhrRequest,
            ActionDetail::XhrResponse { .. } => ActionKind::XhrResponse,
            ActionDetail::FetchRequest { .. } => ActionKind::FetchRequest,
            ActionDetail::FetchResponse { .. } => ActionKind::FetchResponse,
            ActionDetail::FetchError { .. } => ActionKind::FetchError,
            ActionDetail::WindowError { .. } => ActionKind::WindowError,
            ActionDetail::ConsoleErrorLog { .. } => ActionKind::ConsoleErrorLog,
        }
    }
}

/// One observed user/browser interaction or network lifecycle event.
/// Immutable once created; owned by the recorder buffer and only ever
/// borrowed read-only downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(flatten)]
    pub detail: ActionDetail,
    /// Unix milliseconds.
    pub timestamp: i64,
    /// Page URL at the time of the event.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementDescriptor>,
}

impl ActionRecord {
    pub fn kind(&self) -> ActionKind {
        self.detail.kind()
    }

    pub fn selector(&self) -> &str {
        self.element.as_ref().map(|e| e.selector.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_wire_names_match_extension_tags() {
        let json = serde_json::to_string(&ActionKind::CheckboxToggle).unwrap();
        assert_eq!(json, "\"CHECKBOX_TOGGLE\"");
        let json = serde_json::to_string(&ActionKind::ConsoleErrorLog).unwrap();
        assert_eq!(json, "\"CONSOLE_ERROR_LOG\"");
    }

    #[test]
    fn action_record_serializes_with_flattened_tag() {
        let record = ActionRecord {
            detail: ActionDetail::Input {
                value: "hello".to_string(),
            },
            timestamp: 1700000000000,
            url: "https://example.com/form".to_string(),
            element: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "INPUT");
        assert_eq!(value["value"], "hello");
        assert_eq!(value["timestamp"], 1700000000000i64);

        let back: ActionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.kind(), ActionKind::Input);
    }
}
