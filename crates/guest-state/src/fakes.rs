//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryGuestStore`, which satisfies both `EventDirectory` and
//! `RecipientLedger` without any external dependencies, and
//! `FailingGuestStore`, which fails every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryGuestStore
// ---------------------------------------------------------------------------

/// In-memory guest store backed by `HashMap`s keyed by event and
/// (event, recipient).
///
/// Each operation can be switched to fail with `StorageError::Backend` to
/// exercise the fail-open paths of callers.
#[derive(Debug, Default)]
pub struct MemoryGuestStore {
    events: Mutex<HashMap<String, EventContext>>,
    recipients: Mutex<HashMap<(String, String), Option<DateTime<Utc>>>>,
    fail_event_lookups: AtomicBool,
    fail_notice_lookups: AtomicBool,
    fail_mark_sent: AtomicBool,
    mark_sent_calls: AtomicU64,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an event record.
    pub fn insert_event(&self, context: EventContext) {
        let mut events = self.events.lock().unwrap();
        events.insert(context.event_id.0.clone(), context);
    }

    /// Add a recipient to an event, optionally with a prior notice timestamp.
    pub fn insert_recipient(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
        notice_sent_at: Option<DateTime<Utc>>,
    ) {
        let mut recipients = self.recipients.lock().unwrap();
        recipients.insert((event_id.0.clone(), recipient_id.0.clone()), notice_sent_at);
    }

    pub fn fail_event_lookups(&self, fail: bool) {
        self.fail_event_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_notice_lookups(&self, fail: bool) {
        self.fail_notice_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_sent(&self, fail: bool) {
        self.fail_mark_sent.store(fail, Ordering::SeqCst);
    }

    /// Number of `mark_notice_sent` calls received, including failed ones.
    pub fn mark_sent_calls(&self) -> u64 {
        self.mark_sent_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventDirectory for MemoryGuestStore {
    async fn event_context(&self, event_id: &EventId) -> StorageResult<EventContext> {
        if self.fail_event_lookups.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected event lookup failure".to_string()));
        }
        let events = self.events.lock().unwrap();
        events
            .get(&event_id.0)
            .cloned()
            .ok_or_else(|| StorageError::EventNotFound {
                event_id: event_id.0.clone(),
            })
    }
}

#[async_trait]
impl RecipientLedger for MemoryGuestStore {
    async fn notice_state(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
    ) -> StorageResult<RecipientNoticeState> {
        if self.fail_notice_lookups.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected notice lookup failure".to_string()));
        }
        let recipients = self.recipients.lock().unwrap();
        recipients
            .get(&(event_id.0.clone(), recipient_id.0.clone()))
            .map(|sent_at| RecipientNoticeState {
                recipient_id: recipient_id.clone(),
                notice_sent_at: *sent_at,
            })
            .ok_or_else(|| StorageError::RecipientNotFound {
                event_id: event_id.0.clone(),
                recipient_id: recipient_id.0.clone(),
            })
    }

    async fn mark_notice_sent(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
    ) -> StorageResult<DateTime<Utc>> {
        self.mark_sent_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark_sent.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected mark-sent failure".to_string()));
        }
        let mut recipients = self.recipients.lock().unwrap();
        let slot = recipients
            .get_mut(&(event_id.0.clone(), recipient_id.0.clone()))
            .ok_or_else(|| StorageError::RecipientNotFound {
                event_id: event_id.0.clone(),
                recipient_id: recipient_id.0.clone(),
            })?;
        let now = Utc::now();
        *slot = Some(now);
        debug!(event_id = %event_id, recipient_id = %recipient_id, "notice marked sent");
        Ok(now)
    }
}

// ---------------------------------------------------------------------------
// FailingGuestStore
// ---------------------------------------------------------------------------

/// Store whose every operation returns `StorageError::Backend`.
#[derive(Debug, Clone)]
pub struct FailingGuestStore {
    reason: String,
}

impl FailingGuestStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for FailingGuestStore {
    fn default() -> Self {
        Self::new("guest store unavailable")
    }
}

#[async_trait]
impl EventDirectory for FailingGuestStore {
    async fn event_context(&self, _event_id: &EventId) -> StorageResult<EventContext> {
        Err(StorageError::Backend(self.reason.clone()))
    }
}

#[async_trait]
impl RecipientLedger for FailingGuestStore {
    async fn notice_state(
        &self,
        _event_id: &EventId,
        _recipient_id: &RecipientId,
    ) -> StorageResult<RecipientNoticeState> {
        Err(StorageError::Backend(self.reason.clone()))
    }

    async fn mark_notice_sent(
        &self,
        _event_id: &EventId,
        _recipient_id: &RecipientId,
    ) -> StorageResult<DateTime<Utc>> {
        Err(StorageError::Backend(self.reason.clone()))
    }
}
