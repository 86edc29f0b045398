// src/acquisition/mod.rs
//! Sample acquisition: decoding, grid reconciliation, ordered history

pub mod decoder;
pub mod grid;
pub mod monitor;
pub mod ordered_buffer;
pub mod reconstruct;

pub use decoder::SampleDecoder;
pub use grid::{Reconciled, SamplingGrid, TimestampReconciler};
pub use monitor::{AcquisitionCounters, AcquisitionMonitor};
pub use ordered_buffer::OrderedSampleBuffer;
pub use reconstruct::GapReconstructor;
