// src/processing/pipeline.rs
//! End-to-end reconstruction pipeline
//!
//! Owns every stage from payload decode to the recording spool. All state
//! lives behind one object with an explicit lifecycle: lazily initialized
//! on the first reconciled batch, reset on reconnect or by explicit
//! request, and mutated only by its single owner (the worker).

use crate::acquisition::{
    AcquisitionMonitor, GapReconstructor, OrderedSampleBuffer, SampleDecoder,
    TimestampReconciler,
};
use crate::config::constants::recording::RESET_SEED_SAMPLES;
use crate::config::{validate_config, PipelineConfig};
use crate::error::Result;
use crate::processing::features::FeatureExtractor;
use crate::recording::{LiveView, RecordingSpool, Row};
use crate::types::Sample;
use crate::utils::time::TimeProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only copy of the pipeline's observable state.
///
/// Snapshots are full copies: the display and export layers never hold
/// references into live pipeline buffers.
#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    /// Reconciled raw amplitude series
    pub raw_series: Vec<(f64, f32)>,
    /// Short-term RMS series
    pub short_rms_series: Vec<(f64, f32)>,
    /// One-second RMS series
    pub one_sec_rms_series: Vec<(f64, f32)>,
    /// Envelope maxima series
    pub envelope_series: Vec<(f64, f32)>,
    /// Percent-of-MVE series
    pub percent_mve_series: Vec<(f64, f32)>,
    /// Signal Acquisition Ratio percentage
    pub sar: f64,
    /// Batches received this session
    pub received: u64,
    /// Grid positions expected this session
    pub expected: u64,
    /// Whether the spool is recording
    pub recording_active: bool,
    /// Whether a calibration capture is in progress
    pub calibration_active: bool,
}

/// The data-plane pipeline from raw notifications to features and rows.
pub struct SignalPipeline {
    config: PipelineConfig,
    decoder: SampleDecoder,
    reconciler: TimestampReconciler,
    buffer: OrderedSampleBuffer,
    reconstructor: GapReconstructor,
    monitor: AcquisitionMonitor,
    features: FeatureExtractor,
    spool: RecordingSpool,
    live_view: LiveView,
    time: Arc<dyn TimeProvider>,
    calibration_deadline: Option<f64>,
    // grid tick of the newest sample already fed to the feature windows
    feature_watermark: Option<i64>,
    last_featured_timestamp: Option<f64>,
    last_short_rms: f32,
    last_one_sec_rms: f32,
}

impl SignalPipeline {
    /// Create a pipeline from validated configuration.
    pub fn new(config: PipelineConfig, time: Arc<dyn TimeProvider>) -> Result<Self> {
        validate_config(&config)?;

        let interval = config.grid.sample_interval_secs;
        let mut live_view = LiveView::new(config.recording.live_view_capacity);
        live_view.clear_and_seed(interval, RESET_SEED_SAMPLES);

        Ok(Self {
            decoder: SampleDecoder::new(&config.transport),
            reconciler: TimestampReconciler::new(config.grid.clone()),
            buffer: OrderedSampleBuffer::new(config.buffer.history_capacity, interval),
            reconstructor: GapReconstructor::new(&config.buffer, interval),
            monitor: AcquisitionMonitor::new(time.clone()),
            features: FeatureExtractor::new(&config.features),
            spool: RecordingSpool::new(),
            live_view,
            time,
            calibration_deadline: None,
            feature_watermark: None,
            last_featured_timestamp: None,
            last_short_rms: 0.0,
            last_one_sec_rms: 0.0,
            config,
        })
    }

    /// Handle one transport notification.
    ///
    /// Decode failures and clock anomalies drop the payload without
    /// touching pipeline state.
    pub fn on_notification(&mut self, payload: &[u8], arrival_time: f64) -> Result<()> {
        let values = self.decoder.decode(payload)?;
        self.ingest(values, arrival_time)
    }

    /// Ingest one pre-decoded sample batch.
    pub fn ingest(&mut self, values: Vec<f32>, arrival_time: f64) -> Result<()> {
        let reconciled = self.reconciler.reconcile(arrival_time)?;
        if reconciled.session_restarted {
            self.monitor.reset();
        }
        self.monitor.record_received(1);
        self.monitor
            .record_expected(1 + reconciled.loss_events.len() as u64);

        for &t in &reconciled.loss_events {
            self.buffer.push(Sample::placeholder(t));
        }
        self.buffer
            .push(Sample::received(reconciled.logical_timestamp, values));

        let loss_ratio = self.monitor.loss_ratio();
        self.reconstructor
            .maybe_reconstruct(&mut self.buffer, loss_ratio);

        self.feed_new_samples();
        Ok(())
    }

    /// Transport link established.
    pub fn on_connected(&mut self) {
        info!("transport connected");
    }

    /// Transport link lost; the grid and counters reset lazily on the
    /// next successful reconciliation.
    pub fn on_disconnected(&mut self) {
        self.reconciler.arm_reset();
        info!("transport disconnected, grid reset armed");
    }

    /// Start (or resume) recording.
    pub fn start_recording(&mut self) {
        let now = self.time.now_secs();
        self.spool.start(now);
    }

    /// Stop recording and return the export text.
    ///
    /// Partial feature windows are flushed as trailing rows before the
    /// row set is frozen.
    pub fn stop_recording(&mut self) -> String {
        let now = self.time.now_secs();
        if self.spool.is_active() {
            let (short, one_sec) = self.features.flush_partial();
            if short.is_some() || one_sec.is_some() {
                let short = short.unwrap_or(self.last_short_rms);
                let one_sec = one_sec.unwrap_or(self.last_one_sec_rms);
                self.last_short_rms = short;
                self.last_one_sec_rms = one_sec;

                let interval = self.config.grid.sample_interval_secs;
                let timestamp = self
                    .last_featured_timestamp
                    .map(|t| t + interval)
                    .unwrap_or(now);
                self.spool.append(Row {
                    index: self.spool.next_index(),
                    timestamp,
                    raw_value: 0.0,
                    short_rms: short,
                    one_sec_rms: one_sec,
                });
            }
            self.spool.stop(now);
        }
        self.spool.export()
    }

    /// Begin a timed calibration capture.
    pub fn start_calibration(&mut self) {
        let now = self.time.now_secs();
        self.features.start_calibration();
        self.calibration_deadline = Some(now + self.config.features.calibration_secs);
    }

    /// Finish calibration early, returning the MVE reference value.
    pub fn end_calibration(&mut self) -> f32 {
        self.calibration_deadline = None;
        self.features.end_calibration()
    }

    /// Periodic housekeeping, driven by the worker between messages.
    ///
    /// Expires the calibration countdown even when no samples arrive and
    /// keeps the SAR report cadence alive.
    pub fn tick(&mut self) {
        let now = self.time.now_secs();
        if let Some(deadline) = self.calibration_deadline {
            if now >= deadline {
                debug!("calibration countdown expired");
                self.end_calibration();
            }
        }
        self.monitor.sar();
    }

    /// Clear all buffers and state, reseeding the live view.
    pub fn reset(&mut self) {
        self.reconciler = TimestampReconciler::new(self.config.grid.clone());
        self.buffer.clear();
        self.monitor.reset();
        self.features.reset();
        self.spool.clear();
        self.live_view
            .clear_and_seed(self.config.grid.sample_interval_secs, RESET_SEED_SAMPLES);
        self.calibration_deadline = None;
        self.feature_watermark = None;
        self.last_featured_timestamp = None;
        self.last_short_rms = 0.0;
        self.last_one_sec_rms = 0.0;
        info!("pipeline reset");
    }

    /// Copy the observable state for the display and export layers.
    pub fn snapshot(&mut self) -> PipelineSnapshot {
        let counters = self.monitor.counters();
        PipelineSnapshot {
            raw_series: self.live_view.raw.points(),
            short_rms_series: self.live_view.short_rms.points(),
            one_sec_rms_series: self.live_view.one_sec_rms.points(),
            envelope_series: self.live_view.envelope.points(),
            percent_mve_series: self.live_view.percent_mve.points(),
            sar: self.monitor.sar(),
            received: counters.received,
            expected: counters.expected,
            recording_active: self.spool.is_active(),
            calibration_active: self.features.calibration_active(),
        }
    }

    /// Ordered copy of the reconstructed history buffer.
    pub fn history(&self) -> Vec<Sample> {
        self.buffer.snapshot_ordered()
    }

    // Feed every buffered sample newer than the watermark through the
    // feature windows, in ascending order.
    fn feed_new_samples(&mut self) {
        let watermark = self.feature_watermark.unwrap_or(i64::MIN);
        let fresh: Vec<(i64, f64, f32)> = self
            .buffer
            .iter_after(watermark)
            .map(|s| (self.buffer.tick_of(s.timestamp), s.timestamp, s.amplitude()))
            .collect();

        for (tick, timestamp, amplitude) in fresh {
            let output = self.features.push_sample(amplitude);
            if let Some(v) = output.short_rms {
                self.last_short_rms = v;
            }
            if let Some(v) = output.one_sec_rms {
                self.last_one_sec_rms = v;
            }

            self.live_view.record(timestamp, amplitude, &output);

            if self.spool.is_active() {
                let raw_value = if amplitude.is_finite() { amplitude } else { 0.0 };
                self.spool.append(Row {
                    index: self.spool.next_index(),
                    timestamp,
                    raw_value,
                    short_rms: self.last_short_rms,
                    one_sec_rms: self.last_one_sec_rms,
                });
            }

            self.feature_watermark = Some(tick);
            self.last_featured_timestamp = Some(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::MockTimeProvider;

    fn pipeline() -> (SignalPipeline, Arc<MockTimeProvider>) {
        let clock = Arc::new(MockTimeProvider::new(0.0));
        let pipeline =
            SignalPipeline::new(PipelineConfig::default(), clock.clone()).unwrap();
        (pipeline, clock)
    }

    fn feed_steady(pipeline: &mut SignalPipeline, count: usize) {
        for i in 0..count {
            pipeline.ingest(vec![0.5], i as f64 * 0.1).unwrap();
        }
    }

    #[test]
    fn test_live_view_is_seeded_on_creation() {
        let (mut p, _clock) = pipeline();
        let snapshot = p.snapshot();
        assert_eq!(snapshot.raw_series.len(), RESET_SEED_SAMPLES);
    }

    #[test]
    fn test_steady_stream_produces_features() {
        let (mut p, clock) = pipeline();
        feed_steady(&mut p, 25);

        clock.advance_by(10.0);
        let snapshot = p.snapshot();
        // 8 seed zeros plus 25 reconciled samples
        assert_eq!(snapshot.raw_series.len(), RESET_SEED_SAMPLES + 25);
        // two full 10-sample windows emitted
        assert_eq!(snapshot.short_rms_series.len(), 2);
        assert_eq!(snapshot.one_sec_rms_series.len(), 2);
        assert_eq!(snapshot.envelope_series.len(), 2);
        assert_eq!(snapshot.sar, 100.0);
    }

    #[test]
    fn test_decode_failure_leaves_state_untouched() {
        let (mut p, _clock) = pipeline();
        assert!(p.on_notification(&[0x01], 0.0).is_err());

        let snapshot = p.snapshot();
        assert_eq!(snapshot.received, 0);
        assert_eq!(snapshot.expected, 0);
    }

    #[test]
    fn test_loss_events_become_placeholders() {
        let (mut p, _clock) = pipeline();
        p.ingest(vec![0.5], 0.0).unwrap();
        p.ingest(vec![0.5], 0.1).unwrap();
        // jump to 1.1: positions 0.2..0.9 are lost
        p.ingest(vec![0.5], 1.1).unwrap();

        let history = p.history();
        assert_eq!(history.len(), 11);
        let synthetic_count = history.iter().filter(|s| s.synthetic).count();
        assert_eq!(synthetic_count, 8);

        let snapshot_ticks: Vec<i64> = history
            .iter()
            .map(|s| (s.timestamp * 10.0).round() as i64)
            .collect();
        assert_eq!(snapshot_ticks, (0..=10).collect::<Vec<i64>>());
    }

    #[test]
    fn test_sar_reflects_loss() {
        let (mut p, clock) = pipeline();
        p.ingest(vec![0.5], 0.0).unwrap();
        p.ingest(vec![0.5], 0.1).unwrap();
        p.ingest(vec![0.5], 1.1).unwrap();

        clock.advance_by(1.0);
        let snapshot = p.snapshot();
        assert_eq!(snapshot.received, 3);
        assert_eq!(snapshot.expected, 11);
        assert!((snapshot.sar - 3.0 / 11.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_recording_collects_rows() {
        let (mut p, _clock) = pipeline();
        p.start_recording();
        feed_steady(&mut p, 10);

        let export = p.stop_recording();
        let lines: Vec<&str> = export.lines().collect();
        assert!(lines[0].starts_with("Recording Duration (s):,"));
        assert_eq!(lines[1], "Index,Timestamp,EMG,ShortRMS,OneSecRMS");
        // ten samples; the final window filled exactly, so no trailing row
        assert_eq!(lines.len(), 2 + 10);
    }

    #[test]
    fn test_stop_recording_flushes_partial_windows() {
        let (mut p, _clock) = pipeline();
        p.start_recording();
        feed_steady(&mut p, 13);

        let export = p.stop_recording();
        // 13 sample rows plus one trailing partial-window row
        assert_eq!(export.lines().count(), 2 + 13 + 1);
    }

    #[test]
    fn test_recording_survives_stop_for_reexport() {
        let (mut p, _clock) = pipeline();
        p.start_recording();
        feed_steady(&mut p, 10);
        let first = p.stop_recording();
        let second = p.stop_recording();
        assert_eq!(first, second);
    }

    #[test]
    fn test_disconnect_resets_grid_lazily() {
        let (mut p, clock) = pipeline();
        p.ingest(vec![0.5], 0.0).unwrap();
        p.ingest(vec![0.5], 0.1).unwrap();
        p.on_disconnected();

        // next batch re-anchors the grid with no placeholder flood
        p.ingest(vec![0.5], 50.0).unwrap();

        clock.advance_by(1.0);
        let snapshot = p.snapshot();
        assert_eq!(snapshot.received, 1);
        assert_eq!(snapshot.expected, 1);
        assert_eq!(snapshot.sar, 100.0);
    }

    #[test]
    fn test_calibration_deadline_is_timer_driven() {
        let (mut p, clock) = pipeline();
        p.start_calibration();
        assert!(p.snapshot().calibration_active);

        // no samples arrive at all; the countdown still completes
        clock.advance_by(10.5);
        p.tick();
        assert!(!p.snapshot().calibration_active);
    }

    #[test]
    fn test_reset_reseeds_live_view() {
        let (mut p, _clock) = pipeline();
        feed_steady(&mut p, 20);
        p.start_recording();

        p.reset();
        let snapshot = p.snapshot();
        assert_eq!(snapshot.raw_series.len(), RESET_SEED_SAMPLES);
        assert!(snapshot.raw_series.iter().all(|&(_, v)| v == 0.0));
        assert!(!snapshot.recording_active);
        assert_eq!(snapshot.received, 0);
    }
}
