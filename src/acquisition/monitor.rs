// src/acquisition/monitor.rs
//! Acquisition quality monitoring
//!
//! Tracks received-vs-expected sample counts and derives the Signal
//! Acquisition Ratio (SAR), a proxy for link quality. The monitor only
//! observes and reports; it never mutates the buffers itself.

use crate::config::constants::monitor::{
    DEGRADED_LOW_PERCENT, NOMINAL_PERCENT, NOMINAL_REPORT_SECS, PERFECT_REPORT_SECS,
    SAR_REFRESH_SECS,
};
use crate::utils::time::TimeProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Received/expected sample counters, session-scoped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcquisitionCounters {
    /// Batches actually received
    pub received: u64,
    /// Grid positions that should have been filled
    pub expected: u64,
}

/// Signal Acquisition Ratio monitor with rate-limited reporting.
pub struct AcquisitionMonitor {
    counters: AcquisitionCounters,
    time: Arc<dyn TimeProvider>,
    cached_sar: f64,
    last_computed_at: Option<f64>,
    last_reported_at: Option<f64>,
    last_reported_value: f64,
}

impl AcquisitionMonitor {
    /// Create a monitor using the given clock.
    pub fn new(time: Arc<dyn TimeProvider>) -> Self {
        Self {
            counters: AcquisitionCounters::default(),
            time,
            cached_sar: 0.0,
            last_computed_at: None,
            last_reported_at: None,
            last_reported_value: -1.0,
        }
    }

    /// Count received batches.
    pub fn record_received(&mut self, count: u64) {
        self.counters.received += count;
    }

    /// Count expected grid positions.
    pub fn record_expected(&mut self, count: u64) {
        self.counters.expected += count;
    }

    /// Current counters.
    pub fn counters(&self) -> AcquisitionCounters {
        self.counters
    }

    /// Fraction of expected samples that never arrived.
    pub fn loss_ratio(&self) -> f64 {
        if self.counters.expected == 0 {
            return 0.0;
        }
        let dropped = self.counters.expected - self.counters.received;
        dropped as f64 / self.counters.expected as f64
    }

    /// Signal Acquisition Ratio as a percentage.
    ///
    /// Recomputed at most once per second; intermediate calls return the
    /// cached value. Reporting is further rate-limited per quality band.
    pub fn sar(&mut self) -> f64 {
        let now = self.time.now_secs();
        let due = match self.last_computed_at {
            None => true,
            Some(at) => now - at >= SAR_REFRESH_SECS,
        };
        if due {
            self.cached_sar = self.compute_sar();
            self.last_computed_at = Some(now);
            self.maybe_report(now);
        }
        self.cached_sar
    }

    /// Reset counters and report state for a new session.
    pub fn reset(&mut self) {
        self.counters = AcquisitionCounters::default();
        self.cached_sar = 0.0;
        self.last_computed_at = None;
        self.last_reported_at = None;
        self.last_reported_value = -1.0;
    }

    fn compute_sar(&self) -> f64 {
        if self.counters.received == 0 {
            return 0.0;
        }
        self.counters.received as f64 / self.counters.expected as f64 * 100.0
    }

    fn maybe_report(&mut self, now: f64) {
        let sar = self.cached_sar;
        let since_last = self
            .last_reported_at
            .map(|at| now - at)
            .unwrap_or(f64::INFINITY);

        let report = if sar >= 100.0 {
            since_last >= PERFECT_REPORT_SECS || sar != self.last_reported_value
        } else if sar < DEGRADED_LOW_PERCENT || sar <= NOMINAL_PERCENT {
            true
        } else {
            since_last >= NOMINAL_REPORT_SECS
        };
        if !report {
            return;
        }

        let received = self.counters.received;
        let expected = self.counters.expected;
        if sar < DEGRADED_LOW_PERCENT {
            warn!(sar, received, expected, "signal acquisition severely degraded");
        } else if sar <= NOMINAL_PERCENT {
            info!(sar, received, expected, "signal acquisition recovering");
        } else {
            debug!(sar, received, expected, "signal acquisition ratio");
        }

        self.last_reported_at = Some(now);
        self.last_reported_value = sar;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::MockTimeProvider;

    fn monitor() -> (AcquisitionMonitor, Arc<MockTimeProvider>) {
        let clock = Arc::new(MockTimeProvider::new(0.0));
        (AcquisitionMonitor::new(clock.clone()), clock)
    }

    #[test]
    fn test_sar_perfect_acquisition() {
        let (mut m, _clock) = monitor();
        m.record_received(100);
        m.record_expected(100);
        assert_eq!(m.sar(), 100.0);
    }

    #[test]
    fn test_sar_half_loss() {
        let (mut m, _clock) = monitor();
        m.record_received(50);
        m.record_expected(100);
        assert_eq!(m.sar(), 50.0);
    }

    #[test]
    fn test_sar_zero_before_any_receipt() {
        let (mut m, _clock) = monitor();
        assert_eq!(m.sar(), 0.0);

        m.record_expected(10);
        let (mut m2, _clock) = monitor();
        m2.record_expected(10);
        assert_eq!(m2.sar(), 0.0);
    }

    #[test]
    fn test_sar_recompute_is_rate_limited() {
        let (mut m, clock) = monitor();
        m.record_received(10);
        m.record_expected(10);
        assert_eq!(m.sar(), 100.0);

        // counter changes are invisible until the refresh window passes
        m.record_expected(10);
        assert_eq!(m.sar(), 100.0);

        clock.advance_by(1.0);
        assert_eq!(m.sar(), 50.0);
    }

    #[test]
    fn test_loss_ratio() {
        let (mut m, _clock) = monitor();
        assert_eq!(m.loss_ratio(), 0.0);

        m.record_received(90);
        m.record_expected(100);
        assert!((m.loss_ratio() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_counters() {
        let (mut m, clock) = monitor();
        m.record_received(10);
        m.record_expected(20);
        assert_eq!(m.sar(), 50.0);

        m.reset();
        assert_eq!(m.counters(), AcquisitionCounters::default());
        clock.advance_by(1.0);
        assert_eq!(m.sar(), 0.0);
    }
}
