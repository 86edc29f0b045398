// src/config/mod.rs
//! Pipeline configuration structures

pub mod constants;
pub mod loader;

pub use loader::load_from_path;

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PipelineConfig {
    /// Sampling grid and timestamp reconciliation
    #[serde(default)]
    pub grid: GridConfig,
    /// Ordered history buffer and gap reconstruction
    #[serde(default)]
    pub buffer: BufferConfig,
    /// Feature window sizes and calibration
    #[serde(default)]
    pub features: FeatureConfig,
    /// Recording spool and live view
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Transport payload decoding
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Sampling grid configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    /// Nominal spacing between samples in seconds
    pub sample_interval_secs: f64,
    /// Drift beyond this resets the grid without backfill
    pub realignment_threshold_secs: f64,
    /// Drift beyond this (below realignment) fills as packet loss
    pub loss_threshold_secs: f64,
}

/// History buffer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Bounded ordered history capacity in samples
    pub history_capacity: usize,
    /// Reconstruction trigger ratio (dropped / expected)
    pub loss_ratio_threshold: f64,
}

/// Feature extraction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    /// Short-term RMS window in samples
    pub short_window_samples: usize,
    /// One-second RMS window in samples
    pub one_sec_window_samples: usize,
    /// Envelope window in one-second RMS entries
    pub envelope_window_entries: usize,
    /// Calibration capture duration in seconds
    pub calibration_secs: f64,
}

/// Recording configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Live-view ring capacity per series in points
    pub live_view_capacity: usize,
}

/// Transport decoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Fixed-point divisor for i16 payload words
    pub fixed_point_divisor: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: constants::grid::DEFAULT_SAMPLE_INTERVAL_SECS,
            realignment_threshold_secs: constants::grid::DEFAULT_REALIGNMENT_THRESHOLD_SECS,
            loss_threshold_secs: constants::grid::DEFAULT_LOSS_THRESHOLD_SECS,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            history_capacity: constants::buffer::DEFAULT_HISTORY_CAPACITY,
            loss_ratio_threshold: constants::buffer::DEFAULT_LOSS_RATIO_THRESHOLD,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            short_window_samples: constants::features::DEFAULT_SHORT_WINDOW_SAMPLES,
            one_sec_window_samples: constants::features::DEFAULT_ONE_SEC_WINDOW_SAMPLES,
            envelope_window_entries: constants::features::DEFAULT_ENVELOPE_WINDOW_ENTRIES,
            calibration_secs: constants::features::DEFAULT_CALIBRATION_SECS,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            live_view_capacity: constants::recording::DEFAULT_LIVE_VIEW_CAPACITY,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            fixed_point_divisor: constants::transport::DEFAULT_FIXED_POINT_DIVISOR,
        }
    }
}

/// Validate a pipeline configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.grid.sample_interval_secs <= 0.0 || !config.grid.sample_interval_secs.is_finite() {
        return Err(PipelineError::Configuration {
            field: "grid.sample_interval_secs",
            reason: "must be a positive finite number".to_string(),
        });
    }
    if config.grid.loss_threshold_secs <= config.grid.sample_interval_secs {
        return Err(PipelineError::Configuration {
            field: "grid.loss_threshold_secs",
            reason: "must exceed the sample interval".to_string(),
        });
    }
    if config.grid.realignment_threshold_secs < config.grid.loss_threshold_secs {
        return Err(PipelineError::Configuration {
            field: "grid.realignment_threshold_secs",
            reason: "must not be below the loss threshold".to_string(),
        });
    }
    if config.buffer.history_capacity == 0 {
        return Err(PipelineError::Configuration {
            field: "buffer.history_capacity",
            reason: "must be greater than 0".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&config.buffer.loss_ratio_threshold) {
        return Err(PipelineError::Configuration {
            field: "buffer.loss_ratio_threshold",
            reason: "must be between 0 and 1".to_string(),
        });
    }
    if config.features.short_window_samples == 0
        || config.features.one_sec_window_samples == 0
        || config.features.envelope_window_entries == 0
    {
        return Err(PipelineError::Configuration {
            field: "features",
            reason: "window sizes must be greater than 0".to_string(),
        });
    }
    if config.features.calibration_secs <= 0.0 {
        return Err(PipelineError::Configuration {
            field: "features.calibration_secs",
            reason: "must be positive".to_string(),
        });
    }
    if config.recording.live_view_capacity == 0 {
        return Err(PipelineError::Configuration {
            field: "recording.live_view_capacity",
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.transport.fixed_point_divisor <= 0.0 {
        return Err(PipelineError::Configuration {
            field: "transport.fixed_point_divisor",
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}
