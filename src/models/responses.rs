use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub tab_url: String,
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub tab_url: String,
    pub started_at: String,
    pub action_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct GenericResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CurlResponse {
    pub error_id: String,
    pub curl: String,
}

/// Counters for the popup stats view.
#[derive(Debug, Default, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub console_errors: usize,
    pub network_errors: usize,
    pub today: usize,
}
