//! Observability tests for SMS composition tracing.
//!
//! These tests verify that structured tracing events are emitted for the
//! outcomes the delivery layer alerts on: normal composition, fail-open,
//! kill switch, emergency fallback and mark-sent failures.

use std::sync::Arc;

use guest_state::fakes::{FailingGuestStore, MemoryGuestStore};
use tracing_test::traced_test;
use unveil_sms_core::{
    compose_span, emit_emergency_fallback, emit_fail_open, emit_header_only,
    emit_kill_switch_engaged, emit_message_composed, emit_notice_mark_failed, emit_notice_marked,
    ComposeOptions, ComposerConfig, EventContext, EventId, MessageComposer, RecipientId, Tier,
    ToggleKillSwitch, METRICS,
};

/// Test: emit_message_composed logs tier and flags
#[traced_test]
#[test]
fn test_emit_message_composed_logs_tier() {
    emit_message_composed("evt-1", Tier::DropBrand, 149, 1, true, false, false);
    assert!(logs_contain("sms.composed"));
    assert!(logs_contain("drop_brand"));
}

/// Test: emit_fail_open logs a warning with the raw-text marker
#[traced_test]
#[test]
fn test_emit_fail_open_logs_warning() {
    let error_msg = "connection refused";
    emit_fail_open("evt-2", "guest-2", &error_msg);
    assert!(logs_contain("sms.fail_open"));
    assert!(logs_contain("formatting degraded, using raw text"));
    assert!(logs_contain("connection refused"));
}

/// Test: emergency and header-only emissions do not panic
#[traced_test]
#[test]
fn test_emit_emergency_events() {
    emit_emergency_fallback("evt-3", 16, true);
    emit_header_only("evt-3", 16);
    assert!(logs_contain("sms.emergency_fallback"));
    assert!(logs_contain("sms.header_only"));
}

/// Test: notice bookkeeping emissions
#[traced_test]
#[test]
fn test_emit_notice_events() {
    emit_notice_marked("evt-4", "guest-4");
    emit_notice_mark_failed("evt-4", "guest-4", &"timeout");
    assert!(logs_contain("sms.notice_marked"));
    assert!(logs_contain("sms.notice_mark_failed"));
}

/// Test: kill switch emission is safe to call repeatedly
#[traced_test]
#[test]
fn test_emit_kill_switch_engaged_repeatable() {
    emit_kill_switch_engaged();
    emit_kill_switch_engaged();
}

/// Test: compose_span creates an enterable span
#[traced_test]
#[test]
fn test_compose_span_enter() {
    let span = compose_span("evt-5", "guest-5");
    let entered = span.enter();
    drop(entered);
}

/// Test: a failing store produces a fail-open log line from compose
#[traced_test]
#[tokio::test]
async fn test_compose_fail_open_is_logged() {
    let composer = MessageComposer::from_store(
        Arc::new(FailingGuestStore::new("replica lag")),
        ComposerConfig::default(),
    )
    .expect("composer");

    let result = composer
        .compose(
            &EventId::new(),
            &RecipientId::new(),
            "Hello",
            &ComposeOptions::default(),
        )
        .await;

    assert_eq!(result.text(), "Hello");
    assert!(logs_contain("sms.fail_open"));
    assert!(logs_contain("replica lag"));
}

/// Test: a normal compose logs sms.composed and bumps the counter
#[traced_test]
#[tokio::test]
async fn test_compose_logs_composed_event() {
    let store = Arc::new(MemoryGuestStore::new());
    let event_id = EventId::new();
    let recipient_id = RecipientId::new();
    store.insert_event(EventContext::new(event_id.clone(), "Sam"));
    store.insert_recipient(&event_id, &recipient_id, None);
    let composer = MessageComposer::from_store(store, ComposerConfig::default()).unwrap();
    let before = METRICS.snapshot().composed;

    composer
        .compose(&event_id, &recipient_id, "Hi", &ComposeOptions::default())
        .await;

    assert!(logs_contain("sms.composed"));
    assert!(METRICS.snapshot().composed > before);
}

/// Test: kill-switch passthrough bumps its counter
#[tokio::test]
async fn test_kill_switch_counts_passthrough() {
    let composer =
        MessageComposer::from_store(Arc::new(MemoryGuestStore::new()), ComposerConfig::default())
            .unwrap()
            .with_kill_switch(Arc::new(ToggleKillSwitch::new(true)));
    let before = METRICS.snapshot().kill_switch;

    composer
        .compose(
            &EventId::new(),
            &RecipientId::new(),
            "raw",
            &ComposeOptions::default(),
        )
        .await;

    assert!(METRICS.snapshot().kill_switch > before);
}

/// Test: flush emits without panicking
#[traced_test]
#[test]
fn test_metrics_flush_logs() {
    METRICS.flush();
    assert!(logs_contain("flush"));
}
