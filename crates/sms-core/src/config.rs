//! Composer configuration and the formatting kill switch.
//!
//! `ComposerConfig` holds the fixed text and limits the allocator works with.
//! [`ComposerConfig::validate`] is the startup check that the fixed text
//! still leaves the minimum body space under the longest possible header,
//! so the emergency tier stays unreachable in normal operation.
//!
//! Environment overrides:
//! - `UNVEIL_SMS_BRAND`: brand line shown with the first-time notice
//! - `UNVEIL_SMS_NOTICE`: compliance/opt-out line
//! - `UNVEIL_SMS_LOOKUP_TIMEOUT_MS`: deadline for the two guest-store reads
//! - `UNVEIL_SMS_FORMATTING_DISABLED`: kill switch, read per call by [`EnvKillSwitch`]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::budget::{
    BudgetAllocator, ELLIPSIS, MAX_HEADER_CHARS, MIN_BODY_CHARS, SEGMENT_BUDGET,
};
use crate::error::{ComposeError, Result};
use crate::normalize::{char_len, normalize};
use crate::segments::SINGLE_SEGMENT_CHARS;

pub const DEFAULT_BRAND_LINE: &str = "Sent via Unveil";
pub const DEFAULT_NOTICE_LINE: &str = "Reply STOP to opt out";

pub const BRAND_ENV: &str = "UNVEIL_SMS_BRAND";
pub const NOTICE_ENV: &str = "UNVEIL_SMS_NOTICE";
pub const LOOKUP_TIMEOUT_ENV: &str = "UNVEIL_SMS_LOOKUP_TIMEOUT_MS";
pub const KILL_SWITCH_ENV: &str = "UNVEIL_SMS_FORMATTING_DISABLED";

/// Fixed text and limits for message composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Total characters allowed (one GSM-7 segment)
    pub segment_budget: usize,
    /// Cosmetic line, only ever shown together with the notice
    pub brand_line: String,
    /// Regulatory opt-out line
    pub notice_line: String,
    /// Marker appended to a truncated body
    pub ellipsis: String,
    /// Body characters tier 4 must be able to keep
    pub min_body_chars: usize,
    /// Deadline for the concurrent event/recipient reads; `None` leaves it
    /// to the caller
    pub lookup_timeout: Option<Duration>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            segment_budget: SEGMENT_BUDGET,
            brand_line: DEFAULT_BRAND_LINE.to_string(),
            notice_line: DEFAULT_NOTICE_LINE.to_string(),
            ellipsis: ELLIPSIS.to_string(),
            min_body_chars: MIN_BODY_CHARS,
            lookup_timeout: None,
        }
    }
}

impl ComposerConfig {
    /// Defaults with any environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(brand) = std::env::var(BRAND_ENV) {
            config.brand_line = brand;
        }
        if let Ok(notice) = std::env::var(NOTICE_ENV) {
            config.notice_line = notice;
        }
        if let Ok(raw) = std::env::var(LOOKUP_TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                ComposeError::InvalidConfig(format!("{LOOKUP_TIMEOUT_ENV} is not a number: {raw}"))
            })?;
            config.lookup_timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }

    pub fn with_brand_line(mut self, brand: impl Into<String>) -> Self {
        self.brand_line = brand.into();
        self
    }

    pub fn with_notice_line(mut self, notice: impl Into<String>) -> Self {
        self.notice_line = notice.into();
        self
    }

    pub fn with_segment_budget(mut self, budget: usize) -> Self {
        self.segment_budget = budget;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Allocator sized by this config.
    pub fn allocator(&self) -> BudgetAllocator {
        BudgetAllocator::new(self.segment_budget, self.min_body_chars, self.ellipsis.as_str())
    }

    /// Body characters tier 4 can keep under the longest possible header.
    pub fn worst_case_body_space(&self) -> usize {
        let header = "#".repeat(MAX_HEADER_CHARS);
        self.allocator()
            .truncation_space(&header, Some(&self.notice_line))
            .unwrap_or(0)
    }

    /// Reject configurations that could push a normal message into the
    /// emergency tier.
    pub fn validate(&self) -> Result<()> {
        if self.segment_budget > SINGLE_SEGMENT_CHARS {
            return Err(ComposeError::InvalidConfig(format!(
                "segment budget {} exceeds one segment ({SINGLE_SEGMENT_CHARS} chars)",
                self.segment_budget
            )));
        }
        for (name, line) in [("brand", &self.brand_line), ("notice", &self.notice_line)] {
            if line.trim().is_empty() {
                return Err(ComposeError::InvalidConfig(format!("{name} line is empty")));
            }
            if normalize(line) != *line {
                return Err(ComposeError::InvalidConfig(format!(
                    "{name} line is not GSM-7-safe ASCII: {line:?}"
                )));
            }
        }
        if char_len(&self.ellipsis) != 1 {
            return Err(ComposeError::InvalidConfig(format!(
                "ellipsis must be a single character, got {:?}",
                self.ellipsis
            )));
        }

        let available = self.worst_case_body_space();
        if available < self.min_body_chars {
            return Err(ComposeError::BudgetFloorUnmet {
                available,
                required: self.min_body_chars,
            });
        }
        Ok(())
    }
}

/// Operator-controlled switch that bypasses all formatting when engaged.
///
/// Read once per compose call, never cached, so flipping it takes effect on
/// the next message.
pub trait KillSwitch: Send + Sync {
    fn is_engaged(&self) -> bool;
}

/// In-process switch backed by an `AtomicBool`. Disengaged by default.
#[derive(Debug, Default)]
pub struct ToggleKillSwitch {
    engaged: AtomicBool,
}

impl ToggleKillSwitch {
    pub fn new(engaged: bool) -> Self {
        Self {
            engaged: AtomicBool::new(engaged),
        }
    }

    pub fn set(&self, engaged: bool) {
        self.engaged.store(engaged, Ordering::SeqCst);
    }
}

impl KillSwitch for ToggleKillSwitch {
    fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}

/// Switch read from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvKillSwitch {
    var: String,
}

impl EnvKillSwitch {
    /// Reads `UNVEIL_SMS_FORMATTING_DISABLED`.
    pub fn new() -> Self {
        Self::with_var(KILL_SWITCH_ENV)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvKillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl KillSwitch for EnvKillSwitch {
    fn is_engaged(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| parse_flag(&v))
            .unwrap_or(false)
    }
}

/// `1`, `true`, `yes`, `on` (any case) engage the switch.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
