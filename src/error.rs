// src/error.rs
//! Unified error handling for the stream pipeline
//!
//! No condition in the pipeline is fatal: malformed payloads and clock
//! anomalies drop the offending input and leave all state untouched,
//! capacity overflow is handled by eviction, and degraded link quality is
//! surfaced only through the acquisition monitor.

use thiserror::Error;

/// Errors surfaced by the stream pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport payload could not be decoded; the payload is dropped.
    #[error("malformed payload of {len} bytes: {reason}")]
    Decode {
        /// Payload length in bytes
        len: usize,
        /// Why decoding failed
        reason: String,
    },

    /// Arrival timestamp is non-finite or outside sane bounds; the batch is dropped.
    #[error("arrival time {arrival_time} outside sane clock bounds")]
    ClockAnomaly {
        /// The rejected arrival time in seconds
        arrival_time: f64,
    },

    /// Invalid configuration value detected during validation.
    #[error("invalid configuration for {field}: {reason}")]
    Configuration {
        /// The offending configuration field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Failure reading layered configuration sources.
    #[error("configuration load failed")]
    ConfigLoad(#[from] config::ConfigError),

    /// The worker thread is gone; control commands cannot be delivered.
    #[error("pipeline worker is not running")]
    WorkerUnavailable,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Decode {
            len: 3,
            reason: "odd length".to_string(),
        };
        assert_eq!(err.to_string(), "malformed payload of 3 bytes: odd length");

        let err = PipelineError::ClockAnomaly {
            arrival_time: f64::NAN,
        };
        assert!(err.to_string().contains("clock bounds"));
    }
}
