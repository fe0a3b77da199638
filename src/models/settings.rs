use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// User settings persisted in the key-value store and shipped to
/// notification clients as display policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Master toggle; when off, errors are still recorded to history but
    /// no notifications are pushed.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub position: NotificationPosition,
    /// Auto-dismiss timeout for notification cards.
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_ms: u64,
    /// Status-code allow-list for network-error notifications. Empty means
    /// every failure is shown.
    #[serde(default)]
    pub status_filters: Vec<u16>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub screenshots_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_notification_timeout() -> u64 {
    8000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            position: NotificationPosition::default(),
            notification_timeout_ms: default_notification_timeout(),
            status_filters: Vec::new(),
            theme: Theme::default(),
            screenshots_enabled: true,
        }
    }
}

impl Settings {
    /// Whether a network error with this status passes the allow-list.
    /// Console errors are not status-filtered.
    pub fn status_allowed(&self, status_code: u16) -> bool {
        self.status_filters.is_empty() || self.status_filters.contains(&status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_allows_everything() {
        let settings = Settings::default();
        assert!(settings.status_allowed(404));
        assert!(settings.status_allowed(0));
    }

    #[test]
    fn allow_list_is_exact() {
        let settings = Settings {
            status_filters: vec![404, 500],
            ..Default::default()
        };
        assert!(settings.status_allowed(404));
        assert!(!settings.status_allowed(403));
    }

    #[test]
    fn deserializes_with_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.notification_timeout_ms, 8000);
        assert_eq!(settings.position, NotificationPosition::TopRight);
    }
}
