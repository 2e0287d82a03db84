//! Unveil SMS Core Library
//!
//! Turns a host-authored message body into the exact text sent over a carrier
//! SMS channel: a bracketed event tag, a GSM-7-safe body, an optional link,
//! and the one-time brand and opt-out footer, fitted into one 160-character
//! segment by degrading optional parts in a fixed order.
//!
//! Entry point is [`MessageComposer::compose`]. The pure pieces
//! ([`normalize`], [`event_tag`], [`BudgetAllocator`], [`segment_count`])
//! are exported for direct use and testing.

pub mod budget;
pub mod compose;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod notice;
pub mod obs;
pub mod segments;
pub mod tag;
pub mod telemetry;

pub use budget::{
    Allocation, BudgetAllocator, Components, Tier, ELLIPSIS, MAX_HEADER_CHARS, MIN_BODY_CHARS,
    SEGMENT_BUDGET,
};
pub use compose::{ComposeOptions, FormatPath, FormatResult, MessageComposer};
pub use config::{ComposerConfig, EnvKillSwitch, KillSwitch, ToggleKillSwitch};
pub use error::{ComposeError, Result};
pub use normalize::normalize;
pub use notice::ComplianceNoticeTracker;
pub use segments::segment_count;
pub use tag::{event_tag, header_for, MAX_TAG_CHARS};

pub use guest_state::{
    EventContext, EventDirectory, EventId, RecipientId, RecipientLedger, RecipientNoticeState,
};

pub use metrics::METRICS;
pub use obs::{
    compose_span, emit_emergency_fallback, emit_fail_open, emit_header_only,
    emit_kill_switch_engaged, emit_message_composed, emit_notice_mark_failed, emit_notice_marked,
};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
