use std::env;
use std::path::PathBuf;

/// Tunables for the capture core.
///
/// The action-episode timeout and the input-continuation window were
/// hardcoded (and drifting) in the original extension; here they are
/// configuration with one canonical default each.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Gap between consecutive actions that starts a new interaction
    /// episode, and the trailing window correlated with an error.
    pub action_timeout_ms: i64,
    /// Max age difference for merging consecutive INPUT actions on the
    /// same selector into one group.
    pub input_merge_ms: i64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 5000,
            input_merge_ms: 1000,
        }
    }
}

impl CaptureConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            action_timeout_ms: env_i64("BUGTRAIL_ACTION_TIMEOUT_MS", defaults.action_timeout_ms),
            input_merge_ms: env_i64("BUGTRAIL_INPUT_MERGE_MS", defaults.input_merge_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Explicit database path; `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    pub capture: CaptureConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8876),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            db_path: env::var("BUGTRAIL_DB").ok().map(PathBuf::from),
            capture: CaptureConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8876,
            host: "127.0.0.1".to_string(),
            db_path: None,
            capture: CaptureConfig::default(),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
