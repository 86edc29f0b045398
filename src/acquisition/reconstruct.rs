// src/acquisition/reconstruct.rs
//! Second-pass gap repair over the ordered history
//!
//! The reconciler fills losses it can predict from drift; this pass runs
//! over whatever actually landed in the buffer, including data that
//! arrived out of order, and interpolates the gaps that remain.

use crate::acquisition::ordered_buffer::OrderedSampleBuffer;
use crate::config::constants::buffer::MAX_GAP_FILL_STEPS;
use crate::config::BufferConfig;
use crate::types::Sample;
use tracing::debug;

/// Inserts interpolated samples into gaps wider than one interval.
pub struct GapReconstructor {
    interval: f64,
    loss_ratio_threshold: f64,
}

impl GapReconstructor {
    /// Create a reconstructor for the given grid interval.
    pub fn new(config: &BufferConfig, interval: f64) -> Self {
        Self {
            interval,
            loss_ratio_threshold: config.loss_ratio_threshold,
        }
    }

    /// Run a reconstruction pass when overall loss warrants it.
    ///
    /// Returns the number of synthetic samples inserted. Below the loss
    /// ratio threshold this is a no-op.
    pub fn maybe_reconstruct(
        &self,
        buffer: &mut OrderedSampleBuffer,
        loss_ratio: f64,
    ) -> usize {
        if loss_ratio <= self.loss_ratio_threshold {
            return 0;
        }
        self.reconstruct(buffer)
    }

    /// Unconditionally repair gaps wider than one interval.
    ///
    /// Each qualifying gap is stepped at the grid interval and every
    /// inserted sample carries the midpoint of the two samples bounding
    /// the gap, marked synthetic. Idempotent when no new gaps appeared.
    pub fn reconstruct(&self, buffer: &mut OrderedSampleBuffer) -> usize {
        if buffer.len() < 2 {
            return 0;
        }

        let eps = self.interval * 1e-6;
        let drained = buffer.drain_ordered();
        let mut inserted = 0usize;

        for pair in drained.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let gap = next.timestamp - prev.timestamp;
            if gap <= self.interval + eps {
                continue;
            }

            let fill_value = (prev.amplitude() + next.amplitude()) / 2.0;
            let mut t = prev.timestamp + self.interval;
            let mut steps = 0usize;
            while next.timestamp - t > self.interval * 0.5 && steps < MAX_GAP_FILL_STEPS {
                buffer.push(Sample::synthetic(t, fill_value));
                t += self.interval;
                steps += 1;
                inserted += 1;
            }
        }

        for sample in drained {
            buffer.push(sample);
        }

        if inserted > 0 {
            debug!(inserted, "gap reconstruction inserted synthetic samples");
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (GapReconstructor, OrderedSampleBuffer) {
        let reconstructor = GapReconstructor::new(&BufferConfig::default(), 0.1);
        let buffer = OrderedSampleBuffer::new(500, 0.1);
        (reconstructor, buffer)
    }

    #[test]
    fn test_fills_gap_with_midpoint_values() {
        let (r, mut buf) = setup();
        buf.push(Sample::received(0.0, vec![0.1]));
        buf.push(Sample::received(0.1, vec![0.2]));
        buf.push(Sample::received(0.2, vec![0.2]));
        buf.push(Sample::received(0.5, vec![0.6]));

        let inserted = r.reconstruct(&mut buf);
        assert_eq!(inserted, 2);

        let drained = buf.drain_ordered();
        assert_eq!(drained.len(), 6);

        let synthetic: Vec<&Sample> = drained.iter().filter(|s| s.synthetic).collect();
        assert_eq!(synthetic.len(), 2);
        assert!((synthetic[0].timestamp - 0.3).abs() < 1e-9);
        assert!((synthetic[1].timestamp - 0.4).abs() < 1e-9);

        // midpoint of the real neighbors at 0.2 and 0.5
        let expected = (0.2 + 0.6) / 2.0;
        assert!((synthetic[0].amplitude() - expected).abs() < 1e-6);
        assert!((synthetic[1].amplitude() - expected).abs() < 1e-6);

        let flags: Vec<bool> = drained.iter().map(|s| s.synthetic).collect();
        assert_eq!(flags, vec![false, false, false, true, true, false]);
    }

    #[test]
    fn test_gap_equal_to_interval_is_untouched() {
        let (r, mut buf) = setup();
        buf.push(Sample::received(0.0, vec![0.1]));
        buf.push(Sample::received(0.1, vec![0.2]));

        assert_eq!(r.reconstruct(&mut buf), 0);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_empty_and_single_element_are_no_ops() {
        let (r, mut buf) = setup();
        assert_eq!(r.reconstruct(&mut buf), 0);

        buf.push(Sample::received(0.0, vec![0.1]));
        assert_eq!(r.reconstruct(&mut buf), 0);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let (r, mut buf) = setup();
        buf.push(Sample::received(0.0, vec![0.0]));
        buf.push(Sample::received(0.4, vec![0.4]));

        assert_eq!(r.reconstruct(&mut buf), 3);
        assert_eq!(r.reconstruct(&mut buf), 0);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_trigger_requires_loss_ratio() {
        let (r, mut buf) = setup();
        buf.push(Sample::received(0.0, vec![0.0]));
        buf.push(Sample::received(0.5, vec![0.5]));

        // at or below the 10% threshold nothing runs
        assert_eq!(r.maybe_reconstruct(&mut buf, 0.05), 0);
        assert_eq!(r.maybe_reconstruct(&mut buf, 0.10), 0);
        assert_eq!(buf.len(), 2);

        assert_eq!(r.maybe_reconstruct(&mut buf, 0.2), 4);
    }

    #[test]
    fn test_gap_fill_iteration_cap() {
        let (r, mut buf) = setup();
        buf.push(Sample::received(0.0, vec![0.0]));
        buf.push(Sample::received(100.0, vec![1.0]));

        assert_eq!(r.reconstruct(&mut buf), MAX_GAP_FILL_STEPS);
    }

    #[test]
    fn test_repairs_out_of_order_arrivals() {
        let (r, mut buf) = setup();
        // 0.3 arrived late, after 0.5; the second pass still sees the
        // 0.3..0.5 hole once everything is in order
        buf.push(Sample::received(0.5, vec![0.5]));
        buf.push(Sample::received(0.3, vec![0.3]));
        buf.push(Sample::received(0.0, vec![0.0]));

        let inserted = r.reconstruct(&mut buf);
        // holes: 0.1, 0.2 between 0.0 and 0.3; 0.4 between 0.3 and 0.5
        assert_eq!(inserted, 3);

        let drained = buf.drain_ordered();
        let timestamps: Vec<i64> = drained
            .iter()
            .map(|s| (s.timestamp * 10.0).round() as i64)
            .collect();
        assert_eq!(timestamps, vec![0, 1, 2, 3, 4, 5]);
    }
}
