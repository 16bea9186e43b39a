//! Signaling protocol messages
//!
//! Messages are JSON objects tagged by a `type` field. The server offers, the
//! client answers, and both sides trickle ICE candidates.

use serde::{Deserialize, Serialize};
use teleview_core::IceCandidate;

/// Messages sent from the viewer to the signaling server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Ask the server to start a media session
    RequestOffer {
        /// Client instance ID for correlation in server logs
        client_id: String,
        /// Supported video codecs
        capabilities: Vec<String>,
    },
    /// Answer to a server offer
    Answer {
        /// Answer SDP
        sdp: String,
    },
    /// Local ICE candidate
    IceCandidate(IceCandidate),
    /// Client is going away
    Bye,
}

impl SignalingMessage {
    /// Build an offer request for a fresh session
    pub fn request_offer(client_id: impl Into<String>) -> Self {
        SignalingMessage::RequestOffer {
            client_id: client_id.into(),
            capabilities: vec!["h264".to_string(), "vp8".to_string()],
        }
    }
}

/// Messages sent from the signaling server to the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingResponse {
    /// Session offer carrying the server's video tracks
    Offer {
        /// Offer SDP
        sdp: String,
    },
    /// Remote ICE candidate
    IceCandidate(IceCandidate),
    /// Server-side link statistics
    Stats(ServerStats),
    /// Error response
    Error {
        /// Error message
        error: String,
        /// Error code for programmatic handling
        error_code: String,
    },
}

/// Statistics the server may push over signaling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    /// Outbound bitrate as seen by the server, kbps
    #[serde(default)]
    pub bitrate_kbps: Option<f64>,
    /// Round-trip time, milliseconds
    #[serde(default)]
    pub rtt_ms: Option<f64>,
    /// Packets the server believes were lost
    #[serde(default)]
    pub packets_lost: Option<i64>,
    /// Number of tracks the server is sending
    #[serde(default)]
    pub tracks: Option<usize>,
}
