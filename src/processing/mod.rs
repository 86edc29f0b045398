// src/processing/mod.rs
//! Feature extraction and the end-to-end pipeline

pub mod features;
pub mod pipeline;

pub use features::{calculate_rms, FeatureExtractor, FeatureOutput};
pub use pipeline::{PipelineSnapshot, SignalPipeline};
