//! Media peer abstraction
//!
//! The ingest client drives negotiation through [`MediaPeer`] and learns about
//! remote tracks, local ICE candidates and connection state through
//! [`PeerEvent`]s pushed onto a channel supplied at creation time.

use crate::tracks::IncomingTrack;
use async_trait::async_trait;
use std::sync::Arc;
use teleview_core::{IceCandidate, TeleviewError};
use tokio::sync::mpsc;

/// Connection state of a media peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Created, nothing negotiated yet
    New,
    /// ICE/DTLS in progress
    Connecting,
    /// Media can flow
    Connected,
    /// Connectivity lost, may recover on its own
    Disconnected,
    /// Connectivity failed permanently
    Failed,
    /// Closed locally
    Closed,
}

impl PeerState {
    /// Whether the session needs to be rebuilt
    pub fn is_terminal(&self) -> bool {
        matches!(self, PeerState::Failed | PeerState::Closed)
    }
}

/// Notification from a media peer
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A remote video track was negotiated
    TrackAdded(IncomingTrack),
    /// A remote track stopped
    TrackEnded {
        /// Key of the track that ended
        key: String,
    },
    /// A local ICE candidate is ready to be trickled to the server
    LocalCandidate(IceCandidate),
    /// Connection state changed
    StateChanged(PeerState),
}

/// Cumulative inbound counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InboundStats {
    /// Video bytes received
    pub bytes_received: u64,
    /// Video packets received
    pub packets_received: u64,
    /// Packets lost, when the stack reports it
    pub packets_lost: Option<i64>,
    /// Round-trip time of the selected candidate pair in milliseconds
    pub rtt_ms: Option<f64>,
}

/// Receive-only media peer
#[async_trait]
pub trait MediaPeer: Send + Sync {
    /// Apply a remote offer and return the local answer SDP
    async fn accept_offer(&self, sdp: String) -> Result<String, TeleviewError>;

    /// Add a trickled remote ICE candidate
    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TeleviewError>;

    /// Snapshot inbound counters
    async fn inbound_stats(&self) -> InboundStats;

    /// Close the peer; further calls may fail
    async fn close(&self) -> Result<(), TeleviewError>;
}

/// Creates one media peer per session attempt
#[async_trait]
pub trait PeerFactory: Send + Sync {
    /// Create a peer that reports to `events`
    async fn create(
        &self,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn MediaPeer>, TeleviewError>;
}
