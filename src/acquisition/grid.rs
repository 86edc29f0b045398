// src/acquisition/grid.rs
//! Timestamp reconciliation against the nominal sampling grid
//!
//! Samples arrive in bursts with jitter. Anchoring each batch to a
//! predicted grid position instead of its raw arrival time keeps the
//! downstream windows evenly spaced, which the RMS estimates require.

use crate::config::constants::grid::{MAX_LOSS_FILL_STEPS, MAX_SANE_ARRIVAL_SECS};
use crate::config::GridConfig;
use crate::error::{PipelineError, Result};
use tracing::{debug, warn};

/// Nominal sampling grid state.
///
/// Created on the first sample after (re)connection; `expected_next`
/// advances by `interval` for every accepted position. Reset to `None` on
/// disconnect and re-initialized lazily on the next arrival.
#[derive(Debug, Clone)]
pub struct SamplingGrid {
    /// Arrival time of the first sample in this session
    pub first_timestamp: Option<f64>,
    /// Predicted grid position of the next batch
    pub expected_next: Option<f64>,
    /// Grid spacing in seconds
    pub interval: f64,
}

impl SamplingGrid {
    fn new(interval: f64) -> Self {
        Self {
            first_timestamp: None,
            expected_next: None,
            interval,
        }
    }

    fn clear(&mut self) {
        self.first_timestamp = None;
        self.expected_next = None;
    }
}

/// Outcome of reconciling one incoming batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Grid position assigned to the batch
    pub logical_timestamp: f64,
    /// Grid positions where packet loss is suspected, ascending
    pub loss_events: Vec<f64>,
    /// True when the grid was re-initialized for a new session
    pub session_restarted: bool,
}

/// Assigns incoming batches a position on the nominal sampling grid.
pub struct TimestampReconciler {
    grid: SamplingGrid,
    config: GridConfig,
    // armed by a disconnect; applied on the next successful reconciliation
    pending_reset: bool,
}

impl TimestampReconciler {
    /// Create a reconciler with an uninitialized grid.
    pub fn new(config: GridConfig) -> Self {
        let interval = config.sample_interval_secs;
        Self {
            grid: SamplingGrid::new(interval),
            config,
            pending_reset: false,
        }
    }

    /// Arm a lazy grid reset, applied on the next accepted batch.
    ///
    /// Deferring the reset tolerates brief reconnections without
    /// discarding in-flight history.
    pub fn arm_reset(&mut self) {
        self.pending_reset = true;
    }

    /// Current grid state.
    pub fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    /// Reconcile one batch arrival against the grid.
    ///
    /// Every accepted batch occupies exactly one grid position; suspected
    /// losses are reported as grid positions for the caller to fill with
    /// placeholders and count as expected-but-missing.
    pub fn reconcile(&mut self, arrival_time: f64) -> Result<Reconciled> {
        if !arrival_time.is_finite()
            || arrival_time < 0.0
            || arrival_time > MAX_SANE_ARRIVAL_SECS
        {
            return Err(PipelineError::ClockAnomaly { arrival_time });
        }

        let mut session_restarted = false;
        if self.pending_reset {
            self.grid.clear();
            self.pending_reset = false;
            session_restarted = true;
            debug!(arrival_time, "sampling grid reset after reconnect");
        }

        let interval = self.grid.interval;
        let mut loss_events = Vec::new();

        let logical_timestamp = match self.grid.expected_next {
            None => {
                let anchored = self.quantize(arrival_time);
                self.grid.first_timestamp = Some(arrival_time);
                anchored
            }
            Some(expected) => {
                let drift = arrival_time - expected;
                if drift.abs() > self.config.realignment_threshold_secs {
                    // Desync or reconnection: jump the grid to the arrival
                    // with no backfill, so a long outage cannot trigger an
                    // unbounded placeholder flood.
                    warn!(drift, arrival_time, "grid realignment, no backfill");
                    self.grid.first_timestamp.get_or_insert(arrival_time);
                    self.quantize(arrival_time)
                } else if drift > self.config.loss_threshold_secs {
                    let mut next = expected;
                    while next + interval < arrival_time
                        && loss_events.len() < MAX_LOSS_FILL_STEPS
                    {
                        loss_events.push(next);
                        next = self.quantize(next + interval);
                    }
                    debug!(
                        drift,
                        placeholders = loss_events.len(),
                        "packet loss suspected"
                    );
                    next
                } else {
                    expected
                }
            }
        };

        self.grid.expected_next = Some(self.quantize(logical_timestamp + interval));

        Ok(Reconciled {
            logical_timestamp,
            loss_events,
            session_restarted,
        })
    }

    // Snap a timestamp to the grid resolution so repeated interval
    // arithmetic cannot accumulate float error.
    fn quantize(&self, t: f64) -> f64 {
        (t / self.grid.interval).round() * self.grid.interval
    }
}
