pub mod descriptor;
pub mod grouper;
pub mod hub;
pub mod pipeline;
pub mod recorder;
pub mod session;
pub mod synthesizer;

pub use grouper::StepUnit;
pub use hub::{SessionSignal, SignalHub};
pub use pipeline::{DisplayPolicy, ErrorCapturePipeline, NotificationEvent};
pub use recorder::ActionRecorder;
pub use session::CaptureSession;

/// Char-safe truncation. Messages and element text are frequently Cyrillic,
/// so byte slicing is not an option.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Truncation with a trailing ellipsis, for rendered step text.
pub(crate) fn truncate_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}

/// Path portion of a URL, for step rendering ("GET запрос к /api/items").
pub(crate) fn pathname(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => return url,
    };
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    }
}
