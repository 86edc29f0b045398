// src/config/constants.rs
//! System-wide configuration constants

/// Sampling grid constants
pub mod grid {
    /// Nominal spacing between samples at the default 10 Hz delivery rate
    pub const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 0.1;
    /// Drift beyond this is treated as a reconnection/desync event
    pub const DEFAULT_REALIGNMENT_THRESHOLD_SECS: f64 = 1.0;
    /// Drift beyond this (but below realignment) is treated as packet loss
    pub const DEFAULT_LOSS_THRESHOLD_SECS: f64 = 0.8;
    /// Hard cap on loss placeholders emitted for a single batch
    pub const MAX_LOSS_FILL_STEPS: usize = 64;
    /// Arrival times beyond this are rejected as clock anomalies
    pub const MAX_SANE_ARRIVAL_SECS: f64 = 1.0e9;
}

/// History buffer and gap reconstruction constants
pub mod buffer {
    /// Bounded ordered history capacity in samples
    pub const DEFAULT_HISTORY_CAPACITY: usize = 500;
    /// Reconstruction runs only above this dropped/expected ratio
    pub const DEFAULT_LOSS_RATIO_THRESHOLD: f64 = 0.10;
    /// Hard cap on synthetic samples inserted into a single gap
    pub const MAX_GAP_FILL_STEPS: usize = 64;
}

/// Feature window constants
pub mod features {
    /// Short-term RMS window in samples (~1 s at 10 Hz)
    pub const DEFAULT_SHORT_WINDOW_SAMPLES: usize = 10;
    /// One-second RMS window in samples
    pub const DEFAULT_ONE_SEC_WINDOW_SAMPLES: usize = 10;
    /// Envelope window in one-second RMS entries
    pub const DEFAULT_ENVELOPE_WINDOW_ENTRIES: usize = 10;
    /// Calibration capture duration in seconds
    pub const DEFAULT_CALIBRATION_SECS: f64 = 10.0;
}

/// Acquisition monitor constants
pub mod monitor {
    /// SAR is recomputed at most this often
    pub const SAR_REFRESH_SECS: f64 = 1.0;
    /// Report interval while the ratio sits at 100%
    pub const PERFECT_REPORT_SECS: f64 = 10.0;
    /// Report interval in the nominal band
    pub const NOMINAL_REPORT_SECS: f64 = 1.0;
    /// Below this percentage the link is degraded-low
    pub const DEGRADED_LOW_PERCENT: f64 = 10.0;
    /// Above this percentage the link is nominal
    pub const NOMINAL_PERCENT: f64 = 80.0;
}

/// Recording and live-view constants
pub mod recording {
    /// Live-view ring capacity per series in points
    pub const DEFAULT_LIVE_VIEW_CAPACITY: usize = 2000;
    /// Fraction of the live view evicted per overflow
    pub const LIVE_VIEW_EVICT_FRACTION: f64 = 0.1;
    /// Placeholder zero samples seeded into the raw series on reset
    pub const RESET_SEED_SAMPLES: usize = 8;
}

/// Transport payload constants
pub mod transport {
    /// Fixed-point divisor turning i16 payload words into float amplitudes
    pub const DEFAULT_FIXED_POINT_DIVISOR: f32 = 1000.0;
}
