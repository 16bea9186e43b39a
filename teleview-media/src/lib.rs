//! # Teleview Media
//!
//! Inbound media for the Teleview ingest client: track handles shared with
//! display surfaces, the media peer abstraction the client negotiates
//! through, a webrtc-rs implementation of it, and per-session track
//! bookkeeping.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod peer;
pub mod registry;
pub mod tracks;
pub mod webrtc_peer;

// Re-export main types
pub use peer::{InboundStats, MediaPeer, PeerEvent, PeerFactory, PeerState};
pub use registry::TrackRegistry;
pub use tracks::{IncomingTrack, MediaTrack};
pub use webrtc_peer::{WebRtcPeer, WebRtcPeerFactory};
