//! Message composition: fetch context, build components, allocate, measure.
//!
//! [`MessageComposer::compose`] never fails. When the kill switch is engaged
//! or either guest-store read fails, the caller gets the body back unchanged
//! and the message still goes out.

use std::sync::Arc;

use guest_state::{
    EventContext, EventDirectory, EventId, RecipientId, RecipientLedger, RecipientNoticeState,
    StorageError, StorageResult,
};
use serde::Serialize;
use tracing::Instrument;

use crate::budget::{Allocation, BudgetAllocator, Components, Tier};
use crate::config::{ComposerConfig, KillSwitch, ToggleKillSwitch};
use crate::error::Result;
use crate::metrics::METRICS;
use crate::normalize::{char_len, normalize};
use crate::notice::ComplianceNoticeTracker;
use crate::obs;
use crate::segments::segment_count;
use crate::tag::{event_tag, header_for};

/// Per-message options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    /// URL appended to the body after a space
    pub link: Option<String>,
    /// Show the compliance notice even if it was already sent
    pub force_notice: bool,
}

impl ComposeOptions {
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn forcing_notice(mut self) -> Self {
        self.force_notice = true;
        self
    }
}

/// How the final text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatPath {
    /// Went through the allocator at the given tier
    Formatted { tier: Tier },
    /// Kill switch engaged, body returned verbatim
    KillSwitch,
    /// A guest-store read failed, body returned verbatim
    FailOpen,
}

/// Text to transmit plus facts about it.
///
/// Fields are private and only built from an allocation or a passthrough,
/// so every flag can be reconstructed from `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatResult {
    text: String,
    included_compliance_notice: bool,
    length: usize,
    segments: u32,
    dropped_link: bool,
    truncated_body: bool,
    path: FormatPath,
}

impl FormatResult {
    fn from_allocation(allocation: Allocation) -> Self {
        let tier = allocation.tier();
        let included_compliance_notice = allocation.included_notice();
        let dropped_link = allocation.dropped_link();
        let truncated_body = allocation.truncated_body();
        let text = allocation.into_text();
        Self {
            length: char_len(&text),
            segments: segment_count(&text),
            text,
            included_compliance_notice,
            dropped_link,
            truncated_body,
            path: FormatPath::Formatted { tier },
        }
    }

    fn passthrough(body: &str, path: FormatPath) -> Self {
        Self {
            text: body.to_string(),
            included_compliance_notice: false,
            length: char_len(body),
            segments: segment_count(body),
            dropped_link: false,
            truncated_body: false,
            path,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn included_compliance_notice(&self) -> bool {
        self.included_compliance_notice
    }

    /// Character count of `text`.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn dropped_link(&self) -> bool {
        self.dropped_link
    }

    pub fn truncated_body(&self) -> bool {
        self.truncated_body
    }

    pub fn path(&self) -> FormatPath {
        self.path
    }

    /// Allocator tier, if the text was formatted at all.
    pub fn tier(&self) -> Option<Tier> {
        match self.path {
            FormatPath::Formatted { tier } => Some(tier),
            FormatPath::KillSwitch | FormatPath::FailOpen => None,
        }
    }
}

/// Orchestrates tag generation, normalization and budget allocation for
/// one outbound message at a time. Holds no per-message state; share it
/// across tasks behind an `Arc`.
pub struct MessageComposer {
    events: Arc<dyn EventDirectory>,
    recipients: Arc<dyn RecipientLedger>,
    kill_switch: Arc<dyn KillSwitch>,
    allocator: BudgetAllocator,
    config: ComposerConfig,
}

impl MessageComposer {
    /// Build a composer, refusing configurations that fail
    /// [`ComposerConfig::validate`].
    pub fn new(
        events: Arc<dyn EventDirectory>,
        recipients: Arc<dyn RecipientLedger>,
        config: ComposerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            events,
            recipients,
            kill_switch: Arc::new(ToggleKillSwitch::default()),
            allocator: config.allocator(),
            config,
        })
    }

    /// Composer over a single store that serves both reads.
    pub fn from_store<S>(store: Arc<S>, config: ComposerConfig) -> Result<Self>
    where
        S: EventDirectory + RecipientLedger + 'static,
    {
        Self::new(store.clone(), store, config)
    }

    pub fn with_kill_switch(mut self, kill_switch: Arc<dyn KillSwitch>) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Tracker over the same recipient ledger, for the post-transport write.
    pub fn notice_tracker(&self) -> ComplianceNoticeTracker {
        ComplianceNoticeTracker::new(self.recipients.clone())
    }

    /// Compose the text for one recipient of one event.
    pub async fn compose(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
        body: &str,
        options: &ComposeOptions,
    ) -> FormatResult {
        let span = obs::compose_span(event_id.as_str(), recipient_id.as_str());
        async {
            if self.kill_switch.is_engaged() {
                obs::emit_kill_switch_engaged();
                METRICS.inc_kill_switch();
                return FormatResult::passthrough(body, FormatPath::KillSwitch);
            }

            let (event, notice_state) = match self.fetch_context(event_id, recipient_id).await {
                Ok(context) => context,
                Err(err) => {
                    obs::emit_fail_open(event_id.as_str(), recipient_id.as_str(), &err);
                    METRICS.inc_fail_open();
                    return FormatResult::passthrough(body, FormatPath::FailOpen);
                }
            };

            let owed = ComplianceNoticeTracker::is_owed(&notice_state, options.force_notice);
            self.format(&event, owed, body, options)
        }
        .instrument(span)
        .await
    }

    /// Issue both reads concurrently, bounded by `lookup_timeout` if set.
    async fn fetch_context(
        &self,
        event_id: &EventId,
        recipient_id: &RecipientId,
    ) -> StorageResult<(EventContext, RecipientNoticeState)> {
        let lookups = async {
            let (event, notice_state) = tokio::join!(
                self.events.event_context(event_id),
                self.recipients.notice_state(event_id, recipient_id),
            );
            Ok::<_, StorageError>((event?, notice_state?))
        };

        match self.config.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, lookups)
                .await
                .map_err(|_| StorageError::Timeout)?,
            None => lookups.await,
        }
    }

    /// Pure formatting step: no I/O, no kill-switch check.
    pub fn format(
        &self,
        event: &EventContext,
        notice_owed: bool,
        body: &str,
        options: &ComposeOptions,
    ) -> FormatResult {
        let header = header_for(&event_tag(event.sms_tag.as_deref(), &event.title));
        let body = normalize(body);
        let link = options
            .link
            .as_deref()
            .map(normalize)
            .filter(|link| !link.is_empty());

        let components = Components {
            header: &header,
            body: &body,
            link: link.as_deref(),
            brand: notice_owed.then_some(self.config.brand_line.as_str()),
            notice: notice_owed.then_some(self.config.notice_line.as_str()),
        };
        let allocation = self.allocator.allocate(&components);
        let header_only = allocation.is_header_only(&components);
        let tier = allocation.tier();
        let result = FormatResult::from_allocation(allocation);

        self.record(
            event.event_id.as_str(),
            tier,
            &result,
            char_len(&header),
            notice_owed,
            header_only,
        );
        result
    }

    fn record(
        &self,
        event_id: &str,
        tier: Tier,
        result: &FormatResult,
        header_chars: usize,
        notice_owed: bool,
        header_only: bool,
    ) {
        METRICS.inc_composed();
        if result.dropped_link() {
            METRICS.inc_dropped_link();
        }
        if result.truncated_body() {
            METRICS.inc_truncated_body();
        }
        if result.included_compliance_notice() {
            METRICS.inc_notices_included();
        }

        if tier == Tier::Emergency {
            METRICS.inc_emergency();
            obs::emit_emergency_fallback(event_id, header_chars, notice_owed);
            if header_only {
                obs::emit_header_only(event_id, header_chars);
            }
        }

        obs::emit_message_composed(
            event_id,
            tier,
            result.length(),
            result.segments(),
            result.included_compliance_notice(),
            result.dropped_link(),
            result.truncated_body(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guest_state::fakes::MemoryGuestStore;

    fn composer() -> MessageComposer {
        MessageComposer::from_store(Arc::new(MemoryGuestStore::new()), ComposerConfig::default())
            .unwrap()
    }

    fn wedding() -> EventContext {
        EventContext::new(EventId::from("evt-1"), "Grant's Big Wedding Day")
    }

    #[test]
    fn test_format_first_message_carries_notice_and_brand() {
        let result = composer().format(
            &wedding(),
            true,
            "Join us at 6pm!",
            &ComposeOptions::default(),
        );
        assert_eq!(
            result.text(),
            "[Grant+Big+Wed]\nJoin us at 6pm!\n\nSent via Unveil\nReply STOP to opt out"
        );
        assert!(result.included_compliance_notice());
        assert_eq!(result.segments(), 1);
        assert_eq!(result.length(), result.text().chars().count());
        assert_eq!(result.tier(), Some(Tier::Full));
    }

    #[test]
    fn test_format_normalizes_body_and_link() {
        let options = ComposeOptions::default().with_link("  https://unveil.app/e/1  ");
        let result = composer().format(&wedding(), false, "It\u{2019}s on \u{2014} 6pm", &options);
        assert_eq!(
            result.text(),
            "[Grant+Big+Wed]\nIt's on - 6pm https://unveil.app/e/1"
        );
    }

    #[test]
    fn test_blank_link_is_ignored() {
        let options = ComposeOptions::default().with_link("   ");
        let result = composer().format(&wedding(), false, "Hi", &options);
        assert_eq!(result.text(), "[Grant+Big+Wed]\nHi");
        assert!(!result.dropped_link());
    }

    #[test]
    fn test_explicit_tag_used_in_header() {
        let event = wedding().with_sms_tag("VIP");
        let result = composer().format(&event, false, "Doors at 7", &ComposeOptions::default());
        assert!(result.text().starts_with("[VIP]\n"));
    }

    #[test]
    fn test_passthrough_measures_raw_text() {
        let body = "x".repeat(200);
        let result = FormatResult::passthrough(&body, FormatPath::FailOpen);
        assert_eq!(result.text(), body);
        assert_eq!(result.length(), 200);
        assert_eq!(result.segments(), 2);
        assert!(!result.included_compliance_notice());
        assert!(!result.dropped_link());
        assert!(!result.truncated_body());
        assert_eq!(result.tier(), None);
    }

    /// Composer over an allocator too small for the notice, skipping the
    /// constructor's validation.
    fn cramped_composer() -> MessageComposer {
        let store = Arc::new(MemoryGuestStore::new());
        let config = ComposerConfig::default();
        MessageComposer {
            events: store.clone(),
            recipients: store,
            kill_switch: Arc::new(ToggleKillSwitch::default()),
            allocator: BudgetAllocator::new(40, config.min_body_chars, config.ellipsis.as_str()),
            config,
        }
    }

    #[test]
    fn test_emergency_tier_counted_from_allocation() {
        let before = METRICS.snapshot().emergency;
        let result = cramped_composer().format(
            &wedding(),
            true,
            "Join us at 6pm!",
            &ComposeOptions::default(),
        );
        assert_eq!(result.tier(), Some(Tier::Emergency));
        assert!(!result.included_compliance_notice());
        assert!(METRICS.snapshot().emergency > before);
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = ComposerConfig::default().with_notice_line("n".repeat(150));
        let store = Arc::new(MemoryGuestStore::new());
        assert!(MessageComposer::from_store(store, config).is_err());
    }
}
