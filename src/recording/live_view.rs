// src/recording/live_view.rs
//! Bounded series rings backing the live display
//!
//! Separate from the recording spool: the live view keeps only recent
//! points and sheds the oldest ~10% per overflow, so eviction does not
//! thrash on every new sample.

use crate::processing::features::FeatureOutput;
use std::collections::VecDeque;

/// Single bounded series of (timestamp, value) points.
pub struct SeriesRing {
    points: VecDeque<(f64, f32)>,
    capacity: usize,
    evict_batch: usize,
}

impl SeriesRing {
    /// Create a ring holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            evict_batch: (capacity / 10).max(1),
        }
    }

    /// Append a point, shedding a batch of the oldest on overflow.
    pub fn push(&mut self, timestamp: f64, value: f32) {
        if self.points.len() >= self.capacity {
            for _ in 0..self.evict_batch {
                self.points.pop_front();
            }
        }
        self.points.push_back((timestamp, value));
    }

    /// Copy of the series for a snapshot.
    pub fn points(&self) -> Vec<(f64, f32)> {
        self.points.iter().copied().collect()
    }

    /// Points currently held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no points are held.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop all points.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Live-view series for the display layer.
pub struct LiveView {
    /// Reconciled raw amplitudes
    pub raw: SeriesRing,
    /// Short-term RMS emissions
    pub short_rms: SeriesRing,
    /// One-second RMS emissions
    pub one_sec_rms: SeriesRing,
    /// Envelope maxima
    pub envelope: SeriesRing,
    /// Percent-of-MVE emissions
    pub percent_mve: SeriesRing,
}

impl LiveView {
    /// Create a live view with the given per-series capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            raw: SeriesRing::new(capacity),
            short_rms: SeriesRing::new(capacity),
            one_sec_rms: SeriesRing::new(capacity),
            envelope: SeriesRing::new(capacity),
            percent_mve: SeriesRing::new(capacity),
        }
    }

    /// Record one reconciled sample and whatever features it emitted.
    ///
    /// Non-finite raw values land as 0.0 so the display never sees NaN.
    pub fn record(&mut self, timestamp: f64, amplitude: f32, features: &FeatureOutput) {
        let raw = if amplitude.is_finite() { amplitude } else { 0.0 };
        self.raw.push(timestamp, raw);

        if let Some(v) = features.short_rms {
            self.short_rms.push(timestamp, v);
        }
        if let Some(v) = features.one_sec_rms {
            self.one_sec_rms.push(timestamp, v);
        }
        if let Some(v) = features.envelope {
            self.envelope.push(timestamp, v);
        }
        if let Some(v) = features.percent_mve {
            self.percent_mve.push(timestamp, v);
        }
    }

    /// Clear all series and seed the raw series with placeholder zeros.
    ///
    /// A dependent renderer must never observe an empty raw series.
    pub fn clear_and_seed(&mut self, interval: f64, seed_count: usize) {
        self.raw.clear();
        self.short_rms.clear();
        self.one_sec_rms.clear();
        self.envelope.clear();
        self.percent_mve.clear();

        for i in 0..seed_count {
            self.raw.push(i as f64 * interval, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_batch_eviction() {
        let mut ring = SeriesRing::new(100);
        for i in 0..100 {
            ring.push(i as f64, i as f32);
        }
        assert_eq!(ring.len(), 100);

        // overflow sheds 10 entries at once, not one at a time
        ring.push(100.0, 100.0);
        assert_eq!(ring.len(), 91);
        assert_eq!(ring.points()[0], (10.0, 10.0));
    }

    #[test]
    fn test_tiny_ring_evicts_at_least_one() {
        let mut ring = SeriesRing::new(3);
        for i in 0..5 {
            ring.push(i as f64, i as f32);
        }
        assert!(ring.len() <= 3);
    }

    #[test]
    fn test_record_routes_features() {
        let mut view = LiveView::new(100);
        let features = FeatureOutput {
            short_rms: Some(0.5),
            one_sec_rms: Some(0.4),
            envelope: Some(0.6),
            percent_mve: None,
        };
        view.record(0.1, 0.3, &features);

        assert_eq!(view.raw.len(), 1);
        assert_eq!(view.short_rms.len(), 1);
        assert_eq!(view.one_sec_rms.len(), 1);
        assert_eq!(view.envelope.len(), 1);
        assert!(view.percent_mve.is_empty());
    }

    #[test]
    fn test_record_replaces_non_finite_raw() {
        let mut view = LiveView::new(100);
        view.record(0.1, f32::NAN, &FeatureOutput::default());
        assert_eq!(view.raw.points(), vec![(0.1, 0.0)]);
    }

    #[test]
    fn test_clear_and_seed_leaves_placeholders() {
        let mut view = LiveView::new(100);
        view.record(0.1, 0.3, &FeatureOutput::default());

        view.clear_and_seed(0.1, 8);
        assert_eq!(view.raw.len(), 8);
        assert!(view.raw.points().iter().all(|&(_, v)| v == 0.0));
        assert!(view.short_rms.is_empty());
    }
}
