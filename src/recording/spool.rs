// src/recording/spool.rs
//! Append-only recording session spool and tabular export
//!
//! Decoupled from the live view: rows accumulate for the whole session
//! and survive a stop, so an export can happen after recording ends
//! without re-recording. Rows are cleared only by an explicit reset or by
//! starting a fresh session.

use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::info;

/// One exported row of the reconstructed series.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row index in arrival order
    pub index: usize,
    /// Logical timestamp in seconds
    pub timestamp: f64,
    /// Reconciled raw amplitude
    pub raw_value: f32,
    /// Most recent short-term RMS
    pub short_rms: f32,
    /// Most recent one-second RMS
    pub one_sec_rms: f32,
}

/// Append-only session buffer for export.
pub struct RecordingSpool {
    active: bool,
    session_started: bool,
    start_time: f64,
    duration: f64,
    rows: Vec<Row>,
}

impl RecordingSpool {
    /// Create an idle, empty spool.
    pub fn new() -> Self {
        Self {
            active: false,
            session_started: false,
            start_time: 0.0,
            duration: 0.0,
            rows: Vec::new(),
        }
    }

    /// Begin (or resume) recording. No-op while already active.
    ///
    /// Prior rows are cleared only on the first activation of a session;
    /// resuming after a pause keeps everything already collected.
    pub fn start(&mut self, now: f64) {
        if self.active {
            return;
        }
        if !self.session_started {
            self.rows.clear();
            self.session_started = true;
        }
        self.active = true;
        self.start_time = now;
        info!(start_time = now, rows = self.rows.len(), "recording started");
    }

    /// Stop recording, freezing the row set for export.
    ///
    /// Returns the recording duration. Trailing partial-window rows must
    /// be appended by the caller before stopping.
    pub fn stop(&mut self, now: f64) -> f64 {
        if self.active {
            self.active = false;
            self.duration = now - self.start_time;
            info!(
                duration = self.duration,
                rows = self.rows.len(),
                "recording stopped"
            );
        }
        self.duration
    }

    /// Append a row. Ignored while inactive.
    pub fn append(&mut self, row: Row) -> bool {
        if !self.active {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Index for the next appended row.
    pub fn next_index(&self) -> usize {
        self.rows.len()
    }

    /// Whether recording is currently active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Collected rows, in arrival order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Duration of the last completed recording in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Discard all rows and end the session.
    pub fn clear(&mut self) {
        self.active = false;
        self.session_started = false;
        self.start_time = 0.0;
        self.duration = 0.0;
        self.rows.clear();
    }

    /// Render the frozen row set as newline-delimited tabular text.
    ///
    /// Duplicate timestamps are suppressed (first occurrence kept) and
    /// non-finite numeric fields render as 0.0.
    pub fn export(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Recording Duration (s):,{:.3}", self.duration);
        let _ = writeln!(out, "Index,Timestamp,EMG,ShortRMS,OneSecRMS");

        let mut seen = HashSet::new();
        for row in &self.rows {
            // millisecond-resolution key, well below any sampling grid
            let key = (row.timestamp * 1000.0).round() as i64;
            if !seen.insert(key) {
                continue;
            }
            let _ = writeln!(
                out,
                "{},{:.3},{:.4},{:.4},{:.4}",
                row.index,
                finite_or_zero_f64(row.timestamp),
                finite_or_zero(row.raw_value),
                finite_or_zero(row.short_rms),
                finite_or_zero(row.one_sec_rms),
            );
        }
        out
    }
}

impl Default for RecordingSpool {
    fn default() -> Self {
        Self::new()
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn finite_or_zero_f64(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
