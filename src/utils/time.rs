// src/utils/time.rs
//! Monotonic time access with a mockable provider for deterministic tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Time provider trait for dependency injection and testing.
///
/// All pipeline timing (SAR refresh, report rate limiting, the calibration
/// countdown, recording durations) goes through this trait so tests can
/// drive the clock explicitly.
pub trait TimeProvider: Send + Sync {
    /// Monotonic seconds since an arbitrary origin.
    fn now_secs(&self) -> f64;
}

/// System time provider backed by a monotonic clock.
pub struct SystemTimeProvider {
    origin: Instant,
}

impl SystemTimeProvider {
    /// Create a provider anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Mock time provider for deterministic testing.
pub struct MockTimeProvider {
    // f64 seconds stored as bits so the provider stays lock-free
    current_bits: AtomicU64,
}

impl MockTimeProvider {
    /// Create a mock clock at the given time.
    pub fn new(initial_secs: f64) -> Self {
        Self {
            current_bits: AtomicU64::new(initial_secs.to_bits()),
        }
    }

    /// Advance the mock clock.
    pub fn advance_by(&self, secs: f64) {
        let now = f64::from_bits(self.current_bits.load(Ordering::Relaxed));
        self.current_bits
            .store((now + secs).to_bits(), Ordering::Relaxed);
    }

    /// Set the mock clock to an absolute time.
    pub fn set_time(&self, secs: f64) {
        self.current_bits.store(secs.to_bits(), Ordering::Relaxed);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.current_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_provider_is_monotonic() {
        let provider = SystemTimeProvider::new();
        let a = provider.now_secs();
        let b = provider.now_secs();
        assert!(b >= a);
    }

    #[test]
    fn test_mock_provider_advances() {
        let provider = MockTimeProvider::new(10.0);
        assert_eq!(provider.now_secs(), 10.0);

        provider.advance_by(0.5);
        assert_eq!(provider.now_secs(), 10.5);

        provider.set_time(100.0);
        assert_eq!(provider.now_secs(), 100.0);
    }
}
