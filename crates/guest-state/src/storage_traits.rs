//! Storage trait definitions for guest records
//!
//! These traits define the two read queries and the single write that the
//! SMS composition engine performs against the guest-record store:
//! - `EventDirectory`: event tag/title lookup
//! - `RecipientLedger`: per-(event, recipient) compliance notice state and
//!   the idempotent "mark sent" write
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque identifier for an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Generate a new random EventId
    pub fn new() -> Self {
        EventId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

/// Opaque identifier for a recipient (guest record)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub String);

impl RecipientId {
    /// Generate a new random RecipientId
    pub fn new() -> Self {
        RecipientId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecipientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(s: &str) -> Self {
        RecipientId(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Event fields the composer needs. Fetched fresh on every compose call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub event_id: EventId,
    /// Host-assigned short tag (up to 14 chars), if any
    pub sms_tag: Option<String>,
    /// Event title, used to derive a tag when `sms_tag` is absent
    pub title: String,
}

impl EventContext {
    pub fn new(event_id: EventId, title: impl Into<String>) -> Self {
        Self {
            event_id,
            sms_tag: None,
            title: title.into(),
        }
    }

    pub fn with_sms_tag(mut self, tag: impl Into<String>) -> Self {
        self.sms_tag = Some(tag.into());
        self
    }
}

/// Compliance notice state for one recipient of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientNoticeState {
    pub recipient_id: RecipientId,
    /// When the one-time opt-out notice was last confirmed delivered
    pub notice_sent_at: Option<DateTime<Utc>>,
}

impl RecipientNoticeState {
    /// State for a recipient who has never received the notice.
    pub fn unsent(recipient_id: RecipientId) -> Self {
        Self {
            recipient_id,
            notice_sent_at: None,
        }
    }

    pub fn sent_at(recipient_id: RecipientId, at: DateTime<Utc>) -> Self {
        Self {
            recipient_id,
            notice_sent_at: Some(at),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read access to event records.
#[async_trait]
pub trait EventDirectory: Send + Sync {
    /// Look up the tag and title for an event. Returns
    /// `StorageError::EventNotFound` if absent.
    async fn event_context(&self, event_id: &EventId) -> StorageResult<EventContext>;
}

/// Per-(event, recipient) compliance notice bookkeeping.
///
/// Guarantees:
/// - `notice_state` is a pure read.
/// - `mark_notice_sent` is idempotent: repeated calls overwrite the
///   timestamp (last write wins) and never fail because the flag is
///   already set.
#[async_trait]
pub trait RecipientLedger: Send + Sync {
    /// Read the notice state. Returns `StorageError::RecipientNotFound` if
    /// the recipient is not a guest of the event.
    async fn notice_state(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
    ) -> StorageResult<RecipientNoticeState>;

    /// Record the current time as `notice_sent_at`, returning the stored
    /// timestamp. Callers invoke this only after confirmed transport.
    async fn mark_notice_sent(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
    ) -> StorageResult<DateTime<Utc>>;
}
