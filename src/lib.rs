//! emg-stream: gap-filled reconstruction and real-time amplitude features
//! for wireless EMG sample streams
//!
//! This library turns raw notification payloads plus arrival timestamps
//! into a trustworthy, feature-annotated time series. It provides:
//!
//! - Timestamp reconciliation against a nominal sampling grid
//! - Packet-loss detection and bounded gap interpolation
//! - A bounded timestamp-ordered history buffer
//! - Multi-window RMS, rolling envelope and %MVE features
//! - Acquisition-quality monitoring (Signal Acquisition Ratio)
//! - An append-only recording spool with tabular export
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emg_stream::config::PipelineConfig;
//! use emg_stream::utils::time::SystemTimeProvider;
//! use emg_stream::worker::PipelineWorker;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = PipelineWorker::spawn(
//!         PipelineConfig::default(),
//!         Arc::new(SystemTimeProvider::new()),
//!     )?;
//!     let handle = worker.handle();
//!
//!     handle.on_connected()?;
//!     handle.start_recording()?;
//!
//!     // transport callback delivers payloads with arrival times
//!     handle.on_notification(vec![0xf4, 0x01], 0.1);
//!
//!     let snapshot = handle.snapshot()?;
//!     println!("SAR: {:.1}%", snapshot.sar);
//!
//!     let export = handle.stop_recording()?;
//!     println!("{}", export);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod processing;
pub mod recording;
pub mod types;
pub mod utils;
pub mod worker;

// Re-export commonly used types for convenience
pub use acquisition::{
    AcquisitionMonitor, GapReconstructor, OrderedSampleBuffer, SampleDecoder,
    TimestampReconciler,
};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use processing::{calculate_rms, FeatureExtractor, PipelineSnapshot, SignalPipeline};
pub use recording::{LiveView, RecordingSpool};
pub use types::Sample;
pub use utils::time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
pub use worker::{PipelineHandle, PipelineWorker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "emg-stream");
    }
}
