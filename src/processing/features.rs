// src/processing/features.rs
//! Multi-window amplitude feature extraction
//!
//! Three nested windows over the reconciled sample stream: a short RMS
//! window, a one-second RMS window, and a sliding envelope over the
//! one-second outputs. Optional calibration expresses live RMS as a
//! percentage of maximum voluntary exertion.

use crate::config::FeatureConfig;
use std::collections::VecDeque;
use tracing::{debug, info};

/// RMS over the finite values in a slice.
///
/// Non-finite values are excluded from the mean rather than zeroed, so
/// they cannot bias the estimate; a window with no finite values yields
/// 0.0, never NaN.
pub fn calculate_rms(values: &[f32]) -> f32 {
    let mut sum_squares = 0.0f32;
    let mut count = 0usize;
    for &v in values {
        if v.is_finite() {
            sum_squares += v * v;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        (sum_squares / count as f32).sqrt()
    }
}

/// Clearing accumulator: emits RMS when full, then starts over.
struct RmsWindow {
    capacity: usize,
    buffer: Vec<f32>,
}

impl RmsWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f32) -> Option<f32> {
        self.buffer.push(value);
        if self.buffer.len() >= self.capacity {
            let rms = calculate_rms(&self.buffer);
            self.buffer.clear();
            Some(rms)
        } else {
            None
        }
    }

    // RMS over whatever partial data remains, clearing the window.
    fn flush(&mut self) -> Option<f32> {
        if self.buffer.is_empty() {
            return None;
        }
        let rms = calculate_rms(&self.buffer);
        self.buffer.clear();
        Some(rms)
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Sliding window over one-second RMS outputs, emitting a moving maximum.
struct EnvelopeWindow {
    capacity: usize,
    buffer: VecDeque<f32>,
}

impl EnvelopeWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, rms: f32) -> f32 {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(rms);
        self.buffer.iter().copied().fold(0.0f32, f32::max)
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Calibration capture state.
#[derive(Debug, Default)]
struct CalibrationState {
    active: bool,
    samples: Vec<f32>,
}

/// Feature values emitted for one accepted sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureOutput {
    /// Short-term RMS, present when the short window filled
    pub short_rms: Option<f32>,
    /// One-second RMS, present when the one-second window filled
    pub one_sec_rms: Option<f32>,
    /// Rolling envelope maximum, present alongside each one-second RMS
    pub envelope: Option<f32>,
    /// Percent of maximum voluntary exertion, present after calibration
    pub percent_mve: Option<f32>,
}

/// Maintains the nested feature windows over the reconciled stream.
pub struct FeatureExtractor {
    short: RmsWindow,
    one_sec: RmsWindow,
    envelope: EnvelopeWindow,
    calibration: CalibrationState,
    mve_value: f32,
    calibrated: bool,
}

impl FeatureExtractor {
    /// Create an extractor from feature configuration.
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            short: RmsWindow::new(config.short_window_samples),
            one_sec: RmsWindow::new(config.one_sec_window_samples),
            envelope: EnvelopeWindow::new(config.envelope_window_entries),
            calibration: CalibrationState::default(),
            mve_value: 0.0,
            calibrated: false,
        }
    }

    /// Feed one amplitude sample through all windows.
    pub fn push_sample(&mut self, amplitude: f32) -> FeatureOutput {
        let mut output = FeatureOutput {
            short_rms: self.short.push(amplitude),
            ..FeatureOutput::default()
        };

        if let Some(rms) = self.one_sec.push(amplitude) {
            output.one_sec_rms = Some(rms);
            output.envelope = Some(self.envelope.push(rms));

            if self.calibration.active {
                self.calibration.samples.push(rms);
            }
            if self.calibrated {
                output.percent_mve = Some(self.percent_mve(rms));
            }
        }

        output
    }

    /// Begin collecting one-second RMS values for calibration.
    pub fn start_calibration(&mut self) {
        self.calibration.active = true;
        self.calibration.samples.clear();
        info!("calibration capture started");
    }

    /// Whether a calibration capture is in progress.
    pub fn calibration_active(&self) -> bool {
        self.calibration.active
    }

    /// Finish calibration, reducing the capture to a single MVE value.
    ///
    /// The maximum observed one-second RMS becomes the reference; with no
    /// valid observations the reference stays at the safe default 0.0.
    pub fn end_calibration(&mut self) -> f32 {
        self.calibration.active = false;
        self.mve_value = self
            .calibration
            .samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f32, f32::max);
        self.calibration.samples.clear();
        self.calibrated = true;
        info!(mve_value = self.mve_value, "calibration capture finished");
        self.mve_value
    }

    /// Calibration-relative percentage for an RMS value.
    pub fn percent_mve(&self, rms: f32) -> f32 {
        if self.mve_value == 0.0 {
            return 0.0;
        }
        100.0 * rms / self.mve_value
    }

    /// Current MVE reference value.
    pub fn mve_value(&self) -> f32 {
        self.mve_value
    }

    /// Flush partial short and one-second windows.
    ///
    /// Used when recording stops mid-window so trailing data still gets an
    /// RMS estimate.
    pub fn flush_partial(&mut self) -> (Option<f32>, Option<f32>) {
        let flushed = (self.short.flush(), self.one_sec.flush());
        if flushed.0.is_some() || flushed.1.is_some() {
            debug!("flushed partial feature windows");
        }
        flushed
    }

    /// Clear all windows and calibration state.
    pub fn reset(&mut self) {
        self.short.clear();
        self.one_sec.clear();
        self.envelope.clear();
        self.calibration = CalibrationState::default();
        self.mve_value = 0.0;
        self.calibrated = false;
    }
}
