//! Link statistics surfaced to the stats callback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a stats sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// Polled from the local media peer
    Local,
    /// Pushed by the signaling server
    Server,
}

/// Snapshot of inbound link health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Sample origin
    pub source: StatsSource,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// Inbound video bitrate in kbps
    pub bitrate_kbps: f64,
    /// Round-trip time in milliseconds, if known
    pub rtt_ms: Option<f64>,
    /// Total video bytes received
    pub bytes_received: u64,
    /// Total video packets received
    pub packets_received: u64,
    /// Total packets lost, if reported
    pub packets_lost: Option<i64>,
    /// Number of live inbound tracks
    pub active_tracks: usize,
}

impl LinkStats {
    /// Empty local sample stamped now
    pub fn empty() -> Self {
        Self {
            source: StatsSource::Local,
            timestamp: Utc::now(),
            bitrate_kbps: 0.0,
            rtt_ms: None,
            bytes_received: 0,
            packets_received: 0,
            packets_lost: None,
            active_tracks: 0,
        }
    }

    /// Packet loss percentage over the connection lifetime
    pub fn packet_loss_percentage(&self) -> f64 {
        match self.packets_lost {
            Some(lost) if lost > 0 => {
                let total = self.packets_received as f64 + lost as f64;
                lost as f64 / total * 100.0
            }
            _ => 0.0,
        }
    }

    /// Coarse quality rating for telemetry
    pub fn quality(&self) -> LinkQuality {
        if self.active_tracks == 0 && self.packets_received == 0 {
            return LinkQuality::Unknown;
        }

        let loss = self.packet_loss_percentage();
        let rtt = self.rtt_ms.unwrap_or(0.0);

        if loss < 1.0 && rtt < 50.0 {
            LinkQuality::Excellent
        } else if loss < 3.0 && rtt < 120.0 {
            LinkQuality::Good
        } else if loss < 8.0 && rtt < 250.0 {
            LinkQuality::Fair
        } else {
            LinkQuality::Poor
        }
    }
}

/// Link quality rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkQuality {
    /// Nothing received yet
    Unknown,
    /// Excellent link
    Excellent,
    /// Good link
    Good,
    /// Fair link
    Fair,
    /// Poor link
    Poor,
}
