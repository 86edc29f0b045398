// src/recording/mod.rs
//! Recording spool and live-view series

pub mod live_view;
pub mod spool;

pub use live_view::{LiveView, SeriesRing};
pub use spool::{RecordingSpool, Row};
