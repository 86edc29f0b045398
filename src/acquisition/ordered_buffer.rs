// src/acquisition/ordered_buffer.rs
//! Bounded timestamp-ordered sample buffer
//!
//! Single source of truth for recent history: reconstruction reads it in
//! ascending order and short-horizon lookback stays bounded. On overflow
//! the oldest entry is evicted, never the most recent, so recency is
//! preserved at the cost of old raw history.

use crate::types::Sample;
use std::collections::BTreeMap;
use tracing::trace;

/// Bounded buffer ordered by ascending timestamp.
///
/// Entries are keyed by their grid tick, so no two samples can share a
/// timestamp closer than the grid resolution; a duplicate position keeps
/// the first occurrence.
pub struct OrderedSampleBuffer {
    entries: BTreeMap<i64, Sample>,
    capacity: usize,
    interval: f64,
}

impl OrderedSampleBuffer {
    /// Create a buffer holding at most `capacity` samples on a grid of
    /// the given interval.
    pub fn new(capacity: usize, interval: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
            interval,
        }
    }

    /// Grid tick for a timestamp.
    pub fn tick_of(&self, timestamp: f64) -> i64 {
        (timestamp / self.interval).round() as i64
    }

    /// Insert a sample, evicting the oldest entry on overflow.
    ///
    /// Returns false when the grid position was already occupied (the
    /// existing sample is kept).
    pub fn push(&mut self, sample: Sample) -> bool {
        let tick = self.tick_of(sample.timestamp);
        if self.entries.contains_key(&tick) {
            trace!(timestamp = sample.timestamp, "duplicate grid position dropped");
            return false;
        }

        self.entries.insert(tick, sample);
        while self.entries.len() > self.capacity {
            self.entries.pop_first();
        }
        true
    }

    /// Remove and return the oldest sample.
    pub fn pop_min(&mut self) -> Option<Sample> {
        self.entries.pop_first().map(|(_, sample)| sample)
    }

    /// Drain the entire buffer in ascending timestamp order.
    pub fn drain_ordered(&mut self) -> Vec<Sample> {
        let drained = std::mem::take(&mut self.entries);
        drained.into_values().collect()
    }

    /// Copy the buffer contents in ascending timestamp order.
    pub fn snapshot_ordered(&self) -> Vec<Sample> {
        self.entries.values().cloned().collect()
    }

    /// Samples currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no samples are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate entries with a grid tick strictly greater than `tick`, ascending.
    pub fn iter_after(&self, tick: i64) -> impl Iterator<Item = &Sample> {
        self.entries
            .range((tick + 1)..)
            .map(|(_, sample)| sample)
    }

    /// Remove all samples.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer() -> OrderedSampleBuffer {
        OrderedSampleBuffer::new(500, 0.1)
    }

    #[test]
    fn test_push_and_pop_min() {
        let mut buf = buffer();
        assert!(buf.push(Sample::received(0.2, vec![2.0])));
        assert!(buf.push(Sample::received(0.0, vec![0.0])));
        assert!(buf.push(Sample::received(0.1, vec![1.0])));

        assert_eq!(buf.pop_min().unwrap().timestamp, 0.0);
        assert_eq!(buf.pop_min().unwrap().timestamp, 0.1);
        assert_eq!(buf.pop_min().unwrap().timestamp, 0.2);
        assert!(buf.pop_min().is_none());
    }

    #[test]
    fn test_duplicate_position_keeps_first() {
        let mut buf = buffer();
        assert!(buf.push(Sample::received(0.1, vec![1.0])));
        assert!(!buf.push(Sample::received(0.1, vec![9.0])));

        // 0.14 rounds to the same grid tick as 0.1
        assert!(!buf.push(Sample::received(0.14, vec![9.0])));

        assert_eq!(buf.len(), 1);
        assert_eq!(buf.pop_min().unwrap().values, vec![1.0]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut buf = OrderedSampleBuffer::new(3, 0.1);
        for i in 0..5 {
            buf.push(Sample::received(i as f64 * 0.1, vec![i as f32]));
        }

        assert_eq!(buf.len(), 3);
        // 0.0 and 0.1 were evicted, most recent entries survive
        assert_eq!(buf.pop_min().unwrap().values, vec![2.0]);
        assert_eq!(buf.pop_min().unwrap().values, vec![3.0]);
        assert_eq!(buf.pop_min().unwrap().values, vec![4.0]);
    }

    #[test]
    fn test_drain_ordered_under_out_of_order_pushes() {
        let mut buf = buffer();
        for &t in &[0.5, 0.1, 0.9, 0.3, 0.7] {
            buf.push(Sample::received(t, vec![t as f32]));
        }

        let drained = buf.drain_ordered();
        let timestamps: Vec<f64> = drained.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![0.1, 0.3, 0.5, 0.7, 0.9]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_iter_after_watermark() {
        let mut buf = buffer();
        for i in 0..5 {
            buf.push(Sample::received(i as f64 * 0.1, vec![i as f32]));
        }

        let tick = buf.tick_of(0.2);
        let newer: Vec<f64> = buf.iter_after(tick).map(|s| s.timestamp).collect();
        assert_eq!(newer, vec![0.3, 0.4]);
    }

    proptest! {
        // Drained timestamps are non-decreasing for any push sequence.
        #[test]
        fn prop_drain_is_non_decreasing(ticks in prop::collection::vec(0i64..10_000, 0..200)) {
            let mut buf = OrderedSampleBuffer::new(100, 0.1);
            for tick in ticks {
                buf.push(Sample::received(tick as f64 * 0.1, vec![0.0]));
            }

            let drained = buf.drain_ordered();
            for pair in drained.windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
        }
    }
}
