//! # Teleview - Video Ingest for AR Teleoperation
//!
//! Teleview receives the camera streams of a teleoperated robot over WebRTC,
//! routes each stream to a display surface, and keeps those surfaces attached
//! to spatial anchors that only appear once an immersive session has started.
//!
//! ## Key Features
//!
//! - **Ingest client**: WebSocket signaling, receive-only media peer, bounded
//!   reconnect, periodic link statistics
//! - **Track router**: first-stream and `left`/`right` hint routing onto
//!   primary, left and right surfaces
//! - **Spatial binder**: per-frame re-resolution of late anchors that holds
//!   the last pose while an anchor is missing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use teleview::{
//!     Anchor, DisplaySurface, Pose, SpatialBinder, TrackRouter, VideoClient, VideoPanel,
//! };
//!
//! # fn example() -> Result<(), teleview::TeleviewError> {
//! let primary: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("primary"));
//! let left: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("left"));
//! let right: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("right"));
//!
//! let router = TrackRouter::new(primary.clone(), left.clone(), right.clone());
//! let mut client = VideoClient::new(
//!     "wss://robot.local/ws",
//!     |stats| println!("{:.0} kbps", stats.bitrate_kbps),
//!     move |track, track_id| {
//!         router.route(&track, track_id);
//!     },
//! )?;
//!
//! let binder = SpatialBinder::new();
//! binder.register_panel_with_getter(left, || Some(Anchor::new(Pose::identity())));
//!
//! loop {
//!     client.dispatch();
//!     binder.tick();
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use teleview_core::{IceCandidate, Pose, Quat, TeleviewError, Vec3};
pub use teleview_diagnostics::{init_logging, LinkQuality, LinkStats, StatsSource};
pub use teleview_media::{
    InboundStats, IncomingTrack, MediaPeer, MediaTrack, PeerEvent, PeerFactory, PeerState,
    WebRtcPeerFactory,
};
pub use teleview_signaling::{endpoint_for_page, SIGNALING_PATH};

// Public API modules
pub mod binder;
pub mod client;
pub mod config;
pub mod event;
pub mod router;
mod session;
pub mod surface;

// Re-export main API types
pub use binder::{Anchor, AnchorResolver, SpatialBinder, TickReport};
pub use client::{ConnectionState, VideoClient, VideoClientBuilder};
pub use config::{ClientConfig, ReconnectPolicy};
pub use event::{ClientEvent, EventStream};
pub use router::{RouteDecision, TrackRouter};
pub use surface::{DisplaySurface, VideoPanel};
