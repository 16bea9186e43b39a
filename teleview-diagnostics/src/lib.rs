//! # Teleview Diagnostics
//!
//! Link statistics reported to the stats callback, bitrate estimation and
//! structured logging setup.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod connection_analyzer;
pub mod debug_logger;
pub mod network_profiler;

// Re-export main types
pub use connection_analyzer::{LinkQuality, LinkStats, StatsSource};
pub use debug_logger::init_logging;
pub use network_profiler::BitrateEstimator;
