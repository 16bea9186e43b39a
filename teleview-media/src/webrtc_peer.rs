//! Media peer backed by webrtc-rs

use crate::peer::{InboundStats, MediaPeer, PeerEvent, PeerFactory, PeerState};
use crate::tracks::IncomingTrack;
use async_trait::async_trait;
use std::sync::Arc;
use teleview_core::{IceCandidate, TeleviewError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::stats::StatsReportType;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`WebRtcPeer`]s with a fixed ICE server list
#[derive(Debug, Clone, Default)]
pub struct WebRtcPeerFactory {
    ice_servers: Vec<String>,
}

impl WebRtcPeerFactory {
    /// Create a factory using the given STUN/TURN URLs
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl PeerFactory for WebRtcPeerFactory {
    async fn create(
        &self,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn MediaPeer>, TeleviewError> {
        let peer = WebRtcPeer::new(&self.ice_servers, events).await?;
        let peer: Arc<dyn MediaPeer> = Arc::new(peer);
        Ok(peer)
    }
}

/// Receive-only WebRTC peer connection
pub struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
}

impl std::fmt::Debug for WebRtcPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRtcPeer")
            .field("state", &self.pc.connection_state())
            .finish()
    }
}

fn init_error(e: webrtc::Error) -> TeleviewError {
    TeleviewError::Initialization {
        reason: format!("webrtc peer setup: {}", e),
    }
}

fn negotiation_error(step: &str, e: webrtc::Error) -> TeleviewError {
    TeleviewError::Negotiation {
        reason: format!("{}: {}", step, e),
    }
}

impl WebRtcPeer {
    /// Create a peer connection and wire its callbacks to `events`
    pub async fn new(
        ice_servers: &[String],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self, TeleviewError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(init_error)?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(init_error)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: if ice_servers.is_empty() {
                Vec::new()
            } else {
                vec![RTCIceServer {
                    urls: ice_servers.to_vec(),
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(config).await.map_err(init_error)?);

        let track_events = events.clone();
        pc.on_track(Box::new(
            move |track: Arc<TrackRemote>, _receiver, _transceiver| {
                if track.kind() == RTPCodecType::Video {
                    let incoming = IncomingTrack::from_remote(track);
                    info!(
                        "Remote video track key={} id={:?} codec={}",
                        incoming.key, incoming.id, incoming.mime_type
                    );
                    let _ = track_events.send(PeerEvent::TrackAdded(incoming));
                } else {
                    debug!("Ignoring non-video remote track kind={:?}", track.kind());
                }
                Box::pin(async {})
            },
        ));

        let candidate_events = events.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = candidate_events.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else {
                    return;
                };
                match candidate.to_json() {
                    Ok(json) => {
                        let _ = tx.send(PeerEvent::LocalCandidate(IceCandidate {
                            candidate: json.candidate,
                            sdp_mid: json.sdp_mid,
                            sdp_mline_index: json.sdp_mline_index,
                        }));
                    }
                    Err(e) => warn!("Failed to serialize local ICE candidate: {}", e),
                }
            })
        }));

        let state_events = events;
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            debug!("Peer connection state: {}", state);
            let mapped = match state {
                RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => {
                    PeerState::New
                }
                RTCPeerConnectionState::Connecting => PeerState::Connecting,
                RTCPeerConnectionState::Connected => PeerState::Connected,
                RTCPeerConnectionState::Disconnected => PeerState::Disconnected,
                RTCPeerConnectionState::Failed => PeerState::Failed,
                RTCPeerConnectionState::Closed => PeerState::Closed,
            };
            let _ = state_events.send(PeerEvent::StateChanged(mapped));
            Box::pin(async {})
        }));

        Ok(Self { pc })
    }
}

#[async_trait]
impl MediaPeer for WebRtcPeer {
    async fn accept_offer(&self, sdp: String) -> Result<String, TeleviewError> {
        let offer = RTCSessionDescription::offer(sdp)
            .map_err(|e| negotiation_error("parse offer", e))?;
        self.pc
            .set_remote_description(offer)
            .await
            .map_err(|e| negotiation_error("set remote description", e))?;

        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| negotiation_error("create answer", e))?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(|e| negotiation_error("set local description", e))?;

        debug!("Local answer ready ({} bytes)", answer.sdp.len());
        Ok(answer.sdp)
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TeleviewError> {
        if candidate.is_end_of_candidates() {
            debug!("Remote end-of-candidates");
            return Ok(());
        }

        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            ..Default::default()
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| negotiation_error("add remote candidate", e))
    }

    async fn inbound_stats(&self) -> InboundStats {
        let report = self.pc.get_stats().await;
        let mut stats = InboundStats::default();

        for stat in report.reports.values() {
            match stat {
                StatsReportType::InboundRTP(rtp) if rtp.kind == "video" => {
                    stats.bytes_received += rtp.bytes_received;
                    stats.packets_received += rtp.packets_received;
                }
                StatsReportType::CandidatePair(pair) if pair.nominated => {
                    stats.rtt_ms = Some(pair.current_round_trip_time * 1000.0);
                }
                _ => {}
            }
        }

        stats
    }

    async fn close(&self) -> Result<(), TeleviewError> {
        self.pc.close().await.map_err(|e| TeleviewError::Transport {
            reason: format!("close peer connection: {}", e),
        })
    }
}
