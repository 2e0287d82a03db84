//! Global atomic counters for SMS composition telemetry.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. on a scheduler tick). Alerting watches the
//! degradation counters relative to `composed`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations, no locking.
pub struct Metrics {
    composed: AtomicU64,
    fail_open: AtomicU64,
    kill_switch: AtomicU64,
    dropped_link: AtomicU64,
    truncated_body: AtomicU64,
    emergency: AtomicU64,
    notices_included: AtomicU64,
    mark_sent_failures: AtomicU64,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub composed: u64,
    pub fail_open: u64,
    pub kill_switch: u64,
    pub dropped_link: u64,
    pub truncated_body: u64,
    pub emergency: u64,
    pub notices_included: u64,
    pub mark_sent_failures: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            composed: AtomicU64::new(0),
            fail_open: AtomicU64::new(0),
            kill_switch: AtomicU64::new(0),
            dropped_link: AtomicU64::new(0),
            truncated_body: AtomicU64::new(0),
            emergency: AtomicU64::new(0),
            notices_included: AtomicU64::new(0),
            mark_sent_failures: AtomicU64::new(0),
        }
    }

    fn bump(counter: &AtomicU64, name: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = name, "counter incremented");
    }

    /// A message went through the allocator.
    pub fn inc_composed(&self) {
        Self::bump(&self.composed, "composed");
    }

    /// A guest-store read failed and raw text was returned.
    pub fn inc_fail_open(&self) {
        Self::bump(&self.fail_open, "fail_open");
    }

    /// The kill switch returned raw text.
    pub fn inc_kill_switch(&self) {
        Self::bump(&self.kill_switch, "kill_switch");
    }

    pub fn inc_dropped_link(&self) {
        Self::bump(&self.dropped_link, "dropped_link");
    }

    pub fn inc_truncated_body(&self) {
        Self::bump(&self.truncated_body, "truncated_body");
    }

    /// The emergency tier ran; this is a configuration bug.
    pub fn inc_emergency(&self) {
        Self::bump(&self.emergency, "emergency");
    }

    pub fn inc_notices_included(&self) {
        Self::bump(&self.notices_included, "notices_included");
    }

    pub fn inc_mark_sent_failures(&self) {
        Self::bump(&self.mark_sent_failures, "mark_sent_failures");
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            composed: self.composed.load(Ordering::Relaxed),
            fail_open: self.fail_open.load(Ordering::Relaxed),
            kill_switch: self.kill_switch.load(Ordering::Relaxed),
            dropped_link: self.dropped_link.load(Ordering::Relaxed),
            truncated_body: self.truncated_body.load(Ordering::Relaxed),
            emergency: self.emergency.load(Ordering::Relaxed),
            notices_included: self.notices_included.load(Ordering::Relaxed),
            mark_sent_failures: self.mark_sent_failures.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries rather than on every increment.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            composed = s.composed,
            fail_open = s.fail_open,
            kill_switch = s.kill_switch,
            dropped_link = s.dropped_link,
            truncated_body = s.truncated_body,
            emergency = s.emergency,
            notices_included = s.notices_included,
            mark_sent_failures = s.mark_sent_failures,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.composed,
            &self.fail_open,
            &self.kill_switch,
            &self.dropped_link,
            &self.truncated_body,
            &self.emergency,
            &self.notices_included,
            &self.mark_sent_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
