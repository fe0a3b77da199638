//! End-to-end pipeline tests: sessions, event ingestion, error capture,
//! history persistence, notification gating, and screenshots, all on the
//! in-memory store.

use std::sync::Arc;

use bugtrail_sidecar::api::state::AppState;
use bugtrail_sidecar::capture::synthesizer::NO_STEPS_PLACEHOLDER;
use bugtrail_sidecar::capture::NotificationEvent;
use bugtrail_sidecar::config::Config;
use bugtrail_sidecar::models::{
    ActionKind, ErrorKind, ErrorSignal, RawElement, RawEvent, RawNode,
};
use bugtrail_sidecar::storage::{HistoryStore, KvStore, MemoryStore};

async fn test_state() -> (Arc<AppState>, Arc<dyn KvStore>) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let state = AppState::with_store(Config::default(), store.clone()).await;
    (state, store)
}

fn element(tag: &str, id: &str, text: Option<&str>) -> RawElement {
    RawElement {
        node: RawNode {
            tag: tag.to_string(),
            id: Some(id.to_string()),
            text: text.map(str::to_string),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn click(ts: i64, id: &str, text: &str) -> RawEvent {
    let mut event = RawEvent::new(ActionKind::Click, ts, "https://app.test/orders");
    event.element = Some(element("button", id, Some(text)));
    event
}

fn input(ts: i64, id: &str, value: &str) -> RawEvent {
    let mut event = RawEvent::new(ActionKind::Input, ts, "https://app.test/orders");
    let mut el = element("input", id, None);
    el.node.name = Some(id.to_string());
    event.element = Some(el);
    event.value = Some(value.to_string());
    event
}

#[tokio::test]
async fn console_error_produces_numbered_steps() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/orders".to_string());

    session.record_event(click(1_000, "open", "Открыть")).await;
    session.record_event(input(2_000, "email", "user@test.ru")).await;
    session.record_event(click(3_000, "submit", "Отправить")).await;

    let record = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "TypeError: x is undefined".to_string(),
                timestamp: 4_000,
            },
        )
        .await
        .expect("known session");

    assert_eq!(record.kind, ErrorKind::ConsoleError);
    assert_eq!(record.domain, "app.test");

    let lines: Vec<&str> = record.reproduction_steps.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "1. Кликнуть на \"Открыть\"");
    assert!(lines[1].starts_with("2. Ввести текст в поле"));
    assert!(lines[1].contains("user@test.ru"));
    assert_eq!(lines[2], "3. Кликнуть на \"Отправить\"");
    assert_eq!(lines[3], "4. Ошибка: TypeError: x is undefined");

    // Recorded in both the session list and the persisted history.
    assert_eq!(session.error_count().await, 1);
    let history = state.history.all().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);
}

#[tokio::test]
async fn network_error_without_actions_gets_placeholder_only() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://shop.test/cart".to_string());

    let record = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::NetworkError {
                url: "https://api.shop.test/cart".to_string(),
                method: Some("post".to_string()),
                status_code: Some(500),
                error: None,
                resource_type: Some("xhr".to_string()),
                timestamp: 5_000,
            },
        )
        .await
        .unwrap();

    assert_eq!(record.kind, ErrorKind::NetworkError);
    assert_eq!(
        record.message,
        "Ошибка Network: HTTP 500 - https://api.shop.test/cart"
    );
    // No qualifying actions: the placeholder alone, no trailing error line.
    assert_eq!(record.reproduction_steps, NO_STEPS_PLACEHOLDER);
    assert!(record.user_actions.is_empty());

    let details = record.details.as_ref().unwrap();
    assert_eq!(details.method, "POST");
    let curl = details.curl_command(&record.tab_url);
    assert!(curl.starts_with("curl -X POST"));
    assert!(curl.contains("https://api.shop.test/cart"));
}

#[tokio::test]
async fn stale_actions_fall_outside_the_error_window() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());

    session.record_event(click(1_000, "old", "Старая кнопка")).await;

    // 9 seconds later, far past the 5s correlation window.
    let record = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "boom".to_string(),
                timestamp: 10_000,
            },
        )
        .await
        .unwrap();

    assert_eq!(record.reproduction_steps, NO_STEPS_PLACEHOLDER);
}

#[tokio::test]
async fn buffer_caps_at_thirty_and_attachment_at_twenty() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());

    for i in 0..40 {
        session
            .record_event(click(1_000 + i * 10, &format!("b{}", i), "Кнопка"))
            .await;
    }
    assert_eq!(session.action_count().await, 30);

    let record = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "overflow".to_string(),
                timestamp: 1_500,
            },
        )
        .await
        .unwrap();

    assert_eq!(record.user_actions.len(), 20);
    // The attached slice is the newest tail of the buffer.
    assert_eq!(record.user_actions.last().unwrap().timestamp, 1_390);
}

#[tokio::test]
async fn rapid_typing_merges_into_one_step() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/login".to_string());

    session.record_event(input(1_000, "login", "u")).await;
    session.record_event(input(1_300, "login", "us")).await;
    session.record_event(input(1_600, "login", "user")).await;

    let record = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "err".to_string(),
                timestamp: 2_000,
            },
        )
        .await
        .unwrap();

    let lines: Vec<&str> = record.reproduction_steps.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"user\""), "final value only: {}", lines[0]);
    assert_eq!(lines[1], "2. Ошибка: err");
}

#[tokio::test]
async fn notifications_follow_settings_filters() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());

    // Only 500s surface.
    {
        let mut settings = state.settings.write().await;
        settings.status_filters = vec![500];
    }

    let mut rx = state.subscribe();

    state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::NetworkError {
                url: "https://api.test/a".to_string(),
                method: None,
                status_code: Some(404),
                error: None,
                resource_type: None,
                timestamp: 1_000,
            },
        )
        .await
        .unwrap();

    // Suppressed from display, still in history.
    assert!(rx.try_recv().is_err());
    assert_eq!(state.history.len().await, 1);

    state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::NetworkError {
                url: "https://api.test/b".to_string(),
                method: None,
                status_code: Some(500),
                error: None,
                resource_type: None,
                timestamp: 2_000,
            },
        )
        .await
        .unwrap();

    match rx.try_recv().unwrap() {
        NotificationEvent::ErrorCaptured { record, .. } => {
            assert_eq!(record.details.unwrap().status_code, 500);
        }
        other => panic!("expected ErrorCaptured, got {:?}", other),
    }
    // Screenshot request follows the displayed notification.
    assert!(matches!(
        rx.try_recv().unwrap(),
        NotificationEvent::CaptureScreenshot { .. }
    ));
}

#[tokio::test]
async fn disabled_capture_records_silently() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());
    state.settings.write().await.enabled = false;

    let mut rx = state.subscribe();
    state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "quiet".to_string(),
                timestamp: 1_000,
            },
        )
        .await
        .unwrap();

    assert!(rx.try_recv().is_err());
    assert_eq!(state.history.len().await, 1);
}

#[tokio::test]
async fn screenshot_attaches_to_one_record() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());

    let first = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "first".to_string(),
                timestamp: 1_000,
            },
        )
        .await
        .unwrap();
    let second = state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "second".to_string(),
                timestamp: 2_000,
            },
        )
        .await
        .unwrap();

    let attached = state
        .pipeline
        .attach_screenshot(&first.id, "data:image/png;base64,AAAA")
        .await;
    assert!(attached);
    assert!(!state.pipeline.attach_screenshot("missing", "data:image/png;base64,AAAA").await);

    let stored_first = state.history.find(&first.id).await.unwrap();
    assert!(stored_first.has_screenshot);
    assert_eq!(
        stored_first.screenshot.as_deref(),
        Some("data:image/png;base64,AAAA")
    );

    let stored_second = state.history.find(&second.id).await.unwrap();
    assert!(!stored_second.has_screenshot);
    assert!(stored_second.screenshot.is_none());
}

#[tokio::test]
async fn history_survives_restart() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    {
        let state = AppState::with_store(Config::default(), store.clone()).await;
        let session = state.attach_session("https://app.test/".to_string());
        state
            .pipeline
            .handle(
                &session.id,
                ErrorSignal::ConsoleError {
                    message: "persisted".to_string(),
                    timestamp: 1_000,
                },
            )
            .await
            .unwrap();
        state.flush.flush().await;
    }

    // Fresh state over the same store sees the record.
    let state = AppState::with_store(Config::default(), store).await;
    let history = state.history.all().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "persisted");
}

#[tokio::test]
async fn settings_persist_across_restart() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    {
        let state = AppState::with_store(Config::default(), store.clone()).await;
        let mut settings = state.settings.write().await.clone();
        settings.enabled = false;
        settings.status_filters = vec![500, 502];
        *state.settings.write().await = settings.clone();
        bugtrail_sidecar::storage::persist_settings(&state.flush, &settings);
        state.flush.flush().await;
    }

    let state = AppState::with_store(Config::default(), store).await;
    let settings = state.settings.read().await;
    assert!(!settings.enabled);
    assert_eq!(settings.status_filters, vec![500, 502]);
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let (state, _) = test_state().await;
    let result = state
        .pipeline
        .handle(
            "nope",
            ErrorSignal::ConsoleError {
                message: "x".to_string(),
                timestamp: 1_000,
            },
        )
        .await;
    assert!(result.is_none());
}

#[tokio::test]
async fn detach_drains_pending_writes() {
    let (state, store) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());
    let session_id = session.id.clone();

    state
        .pipeline
        .handle(
            &session_id,
            ErrorSignal::ConsoleError {
                message: "last words".to_string(),
                timestamp: 1_000,
            },
        )
        .await
        .unwrap();

    assert!(state.detach_session(&session_id).await);
    assert!(!state.detach_session(&session_id).await);

    let blob = store
        .get(bugtrail_sidecar::storage::HISTORY_KEY)
        .await
        .unwrap()
        .expect("history flushed on detach");
    assert!(blob.contains("last words"));
}

#[tokio::test]
async fn hub_emission_reaches_the_pipeline() {
    let (state, _) = test_state().await;
    let session = state.attach_session("https://app.test/".to_string());

    let mut rx = state.subscribe();
    state.hub.emit(
        session.id.clone(),
        ErrorSignal::ConsoleError {
            message: "via hub".to_string(),
            timestamp: 1_000,
        },
    );

    // The listener task processes asynchronously.
    let event = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
        .await
        .expect("notification within deadline")
        .unwrap();
    match event {
        NotificationEvent::ErrorCaptured { record, .. } => {
            assert_eq!(record.message, "via hub");
        }
        other => panic!("expected ErrorCaptured, got {:?}", other),
    }
    assert_eq!(state.history.len().await, 1);
}

#[tokio::test]
async fn history_reload_is_independent_of_live_store() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let state = AppState::with_store(Config::default(), store.clone()).await;
    let session = state.attach_session("https://app.test/".to_string());

    state
        .pipeline
        .handle(
            &session.id,
            ErrorSignal::ConsoleError {
                message: "reload me".to_string(),
                timestamp: 1_000,
            },
        )
        .await
        .unwrap();
    state.flush.flush().await;

    let reloaded = HistoryStore::load(store.as_ref(), state.flush.clone()).await;
    assert_eq!(reloaded.len().await, 1);
}
