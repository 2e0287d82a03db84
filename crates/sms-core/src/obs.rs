//! Structured observability hooks for message composition.
//!
//! This module provides:
//! - A compose-scoped tracing span via [`compose_span`]
//! - Emission functions for the composition outcomes the delivery layer
//!   alerts on: normal composition, fail-open, kill switch, emergency tier,
//!   and the compliance mark-sent write
//!
//! Events are emitted at `info!` level unless noted (configurable via
//! `RUST_LOG`). For JSON output, pass `json = true` to
//! [`crate::telemetry::init_tracing`].

use std::sync::Once;

use tracing::{error, info, warn};

use crate::budget::Tier;

static KILL_SWITCH_LOGGED: Once = Once::new();

/// Span covering one compose call, tagged with the (event, recipient) pair.
pub fn compose_span(event_id: &str, recipient_id: &str) -> tracing::Span {
    tracing::info_span!("sms.compose", event_id = %event_id, recipient_id = %recipient_id)
}

/// Emit event: message composed through the allocator.
pub fn emit_message_composed(
    event_id: &str,
    tier: Tier,
    length: usize,
    segments: u32,
    included_notice: bool,
    dropped_link: bool,
    truncated_body: bool,
) {
    info!(
        event = "sms.composed",
        event_id = %event_id,
        tier = tier.as_str(),
        length = length,
        segments = segments,
        included_notice = included_notice,
        dropped_link = dropped_link,
        truncated_body = truncated_body,
    );
}

/// Emit event: a guest-store read failed, raw body returned (warning level).
pub fn emit_fail_open(event_id: &str, recipient_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "sms.fail_open",
        event_id = %event_id,
        recipient_id = %recipient_id,
        error = %error,
        "formatting degraded, using raw text"
    );
}

/// Emit event: kill switch engaged. Logged at most once per process.
pub fn emit_kill_switch_engaged() {
    KILL_SWITCH_LOGGED.call_once(|| {
        info!(
            event = "sms.kill_switch",
            "formatting kill switch engaged, sending raw text"
        );
    });
}

/// Emit event: the emergency tier ran (error level). Under a validated
/// config this is unreachable, so it signals a configuration bug.
pub fn emit_emergency_fallback(event_id: &str, header_chars: usize, notice_dropped: bool) {
    error!(
        event = "sms.emergency_fallback",
        event_id = %event_id,
        header_chars = header_chars,
        notice_dropped = notice_dropped,
        "allocator fell through to emergency tier"
    );
}

/// Emit event: emergency tier kept no body at all (error level).
pub fn emit_header_only(event_id: &str, header_chars: usize) {
    error!(
        event = "sms.header_only",
        event_id = %event_id,
        header_chars = header_chars,
        "message reduced to header alone"
    );
}

/// Emit event: compliance notice recorded as delivered.
pub fn emit_notice_marked(event_id: &str, recipient_id: &str) {
    info!(event = "sms.notice_marked", event_id = %event_id, recipient_id = %recipient_id);
}

/// Emit event: compliance mark-sent write failed (warning level). The send
/// is unaffected; the notice may appear again on a later message.
pub fn emit_notice_mark_failed(event_id: &str, recipient_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "sms.notice_mark_failed",
        event_id = %event_id,
        recipient_id = %recipient_id,
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_span_create() {
        let span = compose_span("evt-1", "guest-1");
        let _entered = span.enter();
    }

    #[test]
    fn test_kill_switch_emission_is_repeatable() {
        emit_kill_switch_engaged();
        emit_kill_switch_engaged();
    }
}
