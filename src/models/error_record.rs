use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::ActionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ConsoleError,
    NetworkError,
}

/// Network-specific fields of a failed request. `status_code == 0` means
/// the request never produced an HTTP response (DNS failure, abort, CORS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDetails {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl NetworkDetails {
    /// cURL replay command for this request, as shown by the history viewer
    /// and the copy-to-clipboard action of a network notification.
    pub fn curl_command(&self, page_url: &str) -> String {
        let origin = origin_of(page_url);
        format!(
            "curl -X {method} '{url}' \\\n  -H 'Accept: */*' \\\n  -H 'Accept-Language: en-US,en;q=0.9' \\\n  -H 'Connection: keep-alive' \\\n  -H 'Origin: {origin}' \\\n  -H 'Referer: {referer}' \\\n  -H 'Sec-Fetch-Dest: empty' \\\n  -H 'Sec-Fetch-Mode: cors' \\\n  -H 'Sec-Fetch-Site: same-origin' \\\n  --compressed \\\n  --insecure \\\n  --verbose",
            method = self.method,
            url = self.url,
            origin = origin,
            referer = page_url,
        )
    }
}

/// scheme://host portion of a URL, best-effort.
fn origin_of(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let host_end = rest.find('/').unwrap_or(rest.len());
        format!("{}{}", &url[..scheme_end + 3], &rest[..host_end])
    } else {
        url.to_string()
    }
}

/// A captured error with its synthesized reproduction trace. Created once
/// by the pipeline; the only allowed later mutation is screenshot
/// attachment, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<NetworkDetails>,
    pub tab_url: String,
    pub domain: String,
    pub reproduction_steps: String,
    #[serde(default)]
    pub user_actions: Vec<ActionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub has_screenshot: bool,
}

impl ErrorRecord {
    /// Fresh id: capture timestamp plus a random suffix. Repeated identical
    /// errors get distinct ids; no de-duplication is performed.
    pub fn new_id(timestamp: i64) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}", timestamp, &suffix[..8])
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_else(Utc::now)
    }
}
