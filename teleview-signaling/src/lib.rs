//! # Teleview Signaling
//!
//! Signaling for Teleview video ingest: the JSON protocol spoken with the
//! video server, endpoint resolution from the hosting page, and the
//! WebSocket client that carries it.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod endpoint;
pub mod protocol;

// Re-export main types
pub use client::{SignalingClient, SignalingReceiver, SignalingSender};
pub use endpoint::{endpoint_for_page, parse_signaling_url, SIGNALING_PATH};
pub use protocol::{ServerStats, SignalingMessage, SignalingResponse};
