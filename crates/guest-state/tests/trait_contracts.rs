//! Trait contract tests for EventDirectory and RecipientLedger.
//!
//! These tests verify the behavioral contracts of the storage traits
//! using in-memory fakes. Any conforming implementation must pass these.

use chrono::{Duration, Utc};
use guest_state::fakes::{FailingGuestStore, MemoryGuestStore};
use guest_state::storage_traits::*;
use guest_state::StorageError;

fn seeded_store() -> (MemoryGuestStore, EventId, RecipientId) {
    let store = MemoryGuestStore::new();
    let event_id = EventId::from("evt-wedding");
    let recipient_id = RecipientId::from("guest-1");
    store.insert_event(EventContext::new(event_id.clone(), "Grant's Big Wedding Day"));
    store.insert_recipient(&event_id, &recipient_id, None);
    (store, event_id, recipient_id)
}

// ===========================================================================
// EventDirectory contract tests
// ===========================================================================

#[tokio::test]
async fn event_lookup_returns_inserted_context() {
    let (store, event_id, _) = seeded_store();
    let ctx = store.event_context(&event_id).await.unwrap();

    assert_eq!(ctx.title, "Grant's Big Wedding Day");
    assert!(ctx.sms_tag.is_none());
}

#[tokio::test]
async fn event_lookup_not_found() {
    let store = MemoryGuestStore::new();
    let err = store
        .event_context(&EventId::from("missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::EventNotFound { .. }));
}

#[tokio::test]
async fn event_lookup_sees_tag_edits_immediately() {
    let (store, event_id, _) = seeded_store();
    store.insert_event(
        EventContext::new(event_id.clone(), "Grant's Big Wedding Day").with_sms_tag("GW2026"),
    );

    let ctx = store.event_context(&event_id).await.unwrap();
    assert_eq!(ctx.sms_tag.as_deref(), Some("GW2026"));
}

// ===========================================================================
// RecipientLedger contract tests
// ===========================================================================

#[tokio::test]
async fn notice_state_starts_unsent() {
    let (store, event_id, recipient_id) = seeded_store();
    let state = store.notice_state(&event_id, &recipient_id).await.unwrap();

    assert_eq!(state.recipient_id, recipient_id);
    assert!(state.notice_sent_at.is_none());
}

#[tokio::test]
async fn notice_state_reports_prior_timestamp() {
    let store = MemoryGuestStore::new();
    let event_id = EventId::new();
    let recipient_id = RecipientId::new();
    let earlier = Utc::now() - Duration::days(3);
    store.insert_recipient(&event_id, &recipient_id, Some(earlier));

    let state = store.notice_state(&event_id, &recipient_id).await.unwrap();
    assert_eq!(state.notice_sent_at, Some(earlier));
}

#[tokio::test]
async fn notice_state_is_scoped_per_event() {
    let (store, _, recipient_id) = seeded_store();
    let err = store
        .notice_state(&EventId::from("other-event"), &recipient_id)
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::RecipientNotFound { .. }));
}

#[tokio::test]
async fn mark_sent_sets_timestamp() {
    let (store, event_id, recipient_id) = seeded_store();
    let stamped = store
        .mark_notice_sent(&event_id, &recipient_id)
        .await
        .unwrap();

    let state = store.notice_state(&event_id, &recipient_id).await.unwrap();
    assert_eq!(state.notice_sent_at, Some(stamped));
}

#[tokio::test]
async fn mark_sent_is_idempotent_last_write_wins() {
    let (store, event_id, recipient_id) = seeded_store();
    let first = store
        .mark_notice_sent(&event_id, &recipient_id)
        .await
        .unwrap();
    let second = store
        .mark_notice_sent(&event_id, &recipient_id)
        .await
        .unwrap();

    assert!(second >= first);
    let state = store.notice_state(&event_id, &recipient_id).await.unwrap();
    assert_eq!(state.notice_sent_at, Some(second));
    assert_eq!(store.mark_sent_calls(), 2);
}

#[tokio::test]
async fn mark_sent_unknown_recipient_fails() {
    let (store, event_id, _) = seeded_store();
    let err = store
        .mark_notice_sent(&event_id, &RecipientId::from("stranger"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

// ===========================================================================
// Failure injection
// ===========================================================================

#[tokio::test]
async fn injected_failures_surface_as_backend_errors() {
    let (store, event_id, recipient_id) = seeded_store();
    store.fail_event_lookups(true);
    store.fail_notice_lookups(true);
    store.fail_mark_sent(true);

    assert!(matches!(
        store.event_context(&event_id).await,
        Err(StorageError::Backend(_))
    ));
    assert!(matches!(
        store.notice_state(&event_id, &recipient_id).await,
        Err(StorageError::Backend(_))
    ));
    assert!(matches!(
        store.mark_notice_sent(&event_id, &recipient_id).await,
        Err(StorageError::Backend(_))
    ));

    // A failed write leaves the flag untouched.
    store.fail_notice_lookups(false);
    let state = store.notice_state(&event_id, &recipient_id).await.unwrap();
    assert!(state.notice_sent_at.is_none());
}

#[tokio::test]
async fn failing_store_fails_everything() {
    let store = FailingGuestStore::new("db down");
    let event_id = EventId::new();
    let recipient_id = RecipientId::new();

    let err = store.event_context(&event_id).await.unwrap_err();
    assert_eq!(err, StorageError::Backend("db down".to_string()));
    assert!(store.notice_state(&event_id, &recipient_id).await.is_err());
    assert!(store
        .mark_notice_sent(&event_id, &recipient_id)
        .await
        .is_err());
}
