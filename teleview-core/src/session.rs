//! Session negotiation primitives shared by signaling and media

use serde::{Deserialize, Serialize};

/// ICE candidate exchanged over signaling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Candidate line; empty marks end of gathering
    pub candidate: String,
    /// Media stream identification tag
    #[serde(default, rename = "sdpMid")]
    pub sdp_mid: Option<String>,
    /// Index of the m-line the candidate belongs to
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
}

impl IceCandidate {
    /// Whether this candidate signals end of gathering
    pub fn is_end_of_candidates(&self) -> bool {
        self.candidate.is_empty()
    }
}
