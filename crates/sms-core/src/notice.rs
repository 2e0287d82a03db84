//! One-time compliance notice bookkeeping.
//!
//! Two-phase protocol: the composer asks [`ComplianceNoticeTracker::is_owed`]
//! (a pure read-side decision) and reports whether the notice made it into
//! the text. The caller performs the write through
//! [`ComplianceNoticeTracker::record_delivery`] only after the transport
//! confirms the send.
//!
//! Two concurrent composes for the same recipient can both see the notice as
//! owed before either write lands. The notice then appears twice, never zero
//! times, and the idempotent write absorbs the duplicate mark. No locking is
//! used for this window.

use std::sync::Arc;

use guest_state::{EventId, RecipientId, RecipientLedger, RecipientNoticeState};

use crate::compose::FormatResult;
use crate::metrics::METRICS;
use crate::obs;

/// Reads and records per-(event, recipient) compliance notice delivery.
#[derive(Clone)]
pub struct ComplianceNoticeTracker {
    ledger: Arc<dyn RecipientLedger>,
}

impl ComplianceNoticeTracker {
    pub fn new(ledger: Arc<dyn RecipientLedger>) -> Self {
        Self { ledger }
    }

    /// The notice is owed if it was never sent or the caller forces it.
    pub fn is_owed(state: &RecipientNoticeState, force_notice: bool) -> bool {
        force_notice || state.notice_sent_at.is_none()
    }

    /// Record the notice as sent. Failures are logged and swallowed; returns
    /// whether the write landed.
    pub async fn mark_sent(&self, event_id: &EventId, recipient_id: &RecipientId) -> bool {
        match self.ledger.mark_notice_sent(event_id, recipient_id).await {
            Ok(_) => {
                obs::emit_notice_marked(event_id.as_str(), recipient_id.as_str());
                true
            }
            Err(err) => {
                METRICS.inc_mark_sent_failures();
                obs::emit_notice_mark_failed(event_id.as_str(), recipient_id.as_str(), &err);
                false
            }
        }
    }

    /// Post-transport hook: marks the notice sent only if `result` actually
    /// carried it. Returns whether a successful write happened.
    pub async fn record_delivery(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
        result: &FormatResult,
    ) -> bool {
        if !result.included_compliance_notice() {
            return false;
        }
        self.mark_sent(event_id, recipient_id).await
    }
}
