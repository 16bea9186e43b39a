//! Background ingest session
//!
//! One task per client drives signaling and the media peer, rebuilding the
//! session with bounded backoff when it is lost. Everything the host sees is
//! queued as a [`ClientEvent`] and delivered later on the host thread.

use crate::client::ConnectionState;
use crate::config::ClientConfig;
use crate::event::ClientEvent;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use teleview_core::TeleviewError;
use teleview_diagnostics::{BitrateEstimator, LinkStats, StatsSource};
use teleview_media::{InboundStats, MediaPeer, PeerEvent, PeerFactory, PeerState, TrackRegistry};
use teleview_signaling::{
    ServerStats, SignalingClient, SignalingMessage, SignalingResponse, SignalingSender,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// Local stats samples allowed to wait for `dispatch`
pub(crate) const MAX_QUEUED_LOCAL_STATS: usize = 32;

/// State and event queue shared between the session task and the client
#[derive(Debug)]
pub(crate) struct SessionShared {
    state: RwLock<ConnectionState>,
    events: mpsc::UnboundedSender<ClientEvent>,
    queued_local_stats: AtomicUsize,
}

impl SessionShared {
    pub(crate) fn new(events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            events,
            queued_local_stats: AtomicUsize::new(0),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Move to `next`, queueing a state event; `Closed` is terminal
    pub(crate) fn set_state(&self, next: ConnectionState) -> bool {
        {
            let mut state = self.state.write();
            if *state == next || *state == ConnectionState::Closed {
                return false;
            }
            debug!("Ingest state {:?} -> {:?}", *state, next);
            *state = next;
        }
        self.emit(ClientEvent::StateChanged { state: next });
        true
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Queue a polled stats sample unless the host has fallen far behind
    pub(crate) fn emit_local_stats(&self, stats: LinkStats) -> bool {
        if self.queued_local_stats.load(Ordering::Acquire) >= MAX_QUEUED_LOCAL_STATS {
            debug!("Host is not dispatching; dropping local stats sample");
            return false;
        }
        self.queued_local_stats.fetch_add(1, Ordering::AcqRel);
        self.emit(ClientEvent::Stats { stats });
        true
    }

    /// Account for a dequeued local sample; true if no newer one is queued
    pub(crate) fn local_stats_dequeued(&self) -> bool {
        self.queued_local_stats.fetch_sub(1, Ordering::AcqRel) <= 1
    }

    fn emit_error(&self, error: TeleviewError) {
        self.emit(ClientEvent::Error {
            error: Arc::new(error),
        });
    }
}

/// Why a session attempt ended
enum SessionEnd {
    Shutdown,
    Lost {
        error: TeleviewError,
        was_connected: bool,
    },
}

/// Inputs of the session task
pub(crate) struct SessionTask {
    pub(crate) config: ClientConfig,
    pub(crate) url: Url,
    pub(crate) client_id: String,
    pub(crate) factory: Arc<dyn PeerFactory>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl SessionTask {
    /// Run sessions until shutdown or until reconnection gives up
    pub(crate) async fn run(mut self) {
        let policy = self.config.reconnect.clone();
        let mut attempt: u32 = 0;
        let mut generation: u64 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            generation += 1;
            self.shared.set_state(ConnectionState::Connecting);

            let (error, was_connected) = match self.run_session(generation).await {
                SessionEnd::Shutdown => break,
                SessionEnd::Lost {
                    error,
                    was_connected,
                } => (error, was_connected),
            };

            warn!("Ingest session {} lost: {}", generation, error);
            let recoverable = error.is_recoverable();
            self.shared.emit_error(error);
            self.shared.set_state(ConnectionState::Disconnected);
            if !recoverable {
                return;
            }

            if was_connected {
                attempt = 0;
            }
            attempt += 1;

            if attempt > policy.max_attempts {
                let attempts = attempt - 1;
                info!("Giving up on {} after {} reconnect attempts", self.url, attempts);
                self.shared
                    .emit_error(TeleviewError::ReconnectExhausted { attempts });
                return;
            }

            let delay = policy.delay(attempt);
            info!(
                "Reconnecting to {} in {:?} (attempt {}/{})",
                self.url, delay, attempt, policy.max_attempts
            );
            self.shared
                .emit(ClientEvent::Reconnecting { attempt, delay });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => break,
            }
        }

        self.shared.set_state(ConnectionState::Closed);
        info!("Ingest session for {} closed", self.url);
    }

    async fn run_session(&mut self, generation: u64) -> SessionEnd {
        let connect_timeout = self.config.connect_timeout;

        let signaling = tokio::select! {
            result = SignalingClient::connect(&self.url, connect_timeout) => result,
            _ = self.shutdown.changed() => return SessionEnd::Shutdown,
        };
        let signaling = match signaling {
            Ok(signaling) => signaling,
            Err(error) => {
                return SessionEnd::Lost {
                    error,
                    was_connected: false,
                }
            }
        };
        let (mut sender, mut receiver) = signaling.into_split();

        let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
        let peer = match self.factory.create(peer_tx).await {
            Ok(peer) => peer,
            Err(error) => {
                let _ = sender.close().await;
                return SessionEnd::Lost {
                    error,
                    was_connected: false,
                };
            }
        };

        if let Err(error) = sender
            .send(&SignalingMessage::request_offer(self.client_id.clone()))
            .await
        {
            let _ = peer.close().await;
            return SessionEnd::Lost {
                error,
                was_connected: false,
            };
        }
        info!("Requested offer from {} as {}", self.url, self.client_id);

        let registry = TrackRegistry::new(generation);
        let mut estimator = BitrateEstimator::new();
        let mut stats_timer = tokio::time::interval_at(
            Instant::now() + self.config.stats_interval,
            self.config.stats_interval,
        );
        stats_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let connect_deadline = tokio::time::sleep(connect_timeout);
        tokio::pin!(connect_deadline);
        let mut connected = false;

        let end = loop {
            tokio::select! {
                _ = self.shutdown.changed() => break SessionEnd::Shutdown,

                response = receiver.next_response() => {
                    let response = match response {
                        Some(Ok(response)) => response,
                        Some(Err(error @ TeleviewError::InvalidMessage { .. })) => {
                            warn!("Ignoring undecodable signaling message: {}", error);
                            self.shared.emit_error(error);
                            continue;
                        }
                        Some(Err(error)) => break SessionEnd::Lost { error, was_connected: connected },
                        None => {
                            break SessionEnd::Lost {
                                error: TeleviewError::SignalingClosed {
                                    reason: "server closed the connection".to_string(),
                                },
                                was_connected: connected,
                            }
                        }
                    };

                    if let Err(error) =
                        self.handle_response(response, peer.as_ref(), &mut sender, &registry).await
                    {
                        break SessionEnd::Lost { error, was_connected: connected };
                    }
                }

                Some(event) = peer_rx.recv() => {
                    match event {
                        PeerEvent::TrackAdded(incoming) => {
                            if let Some(track) = registry.admit(incoming) {
                                info!(
                                    "Track {:?} admitted with ordinal {}",
                                    track.id(),
                                    track.ordinal()
                                );
                                self.shared.emit(ClientEvent::TrackReceived { track });
                            }
                        }
                        PeerEvent::TrackEnded { key } => {
                            if let Some(track) = registry.end(&key) {
                                self.shared.emit(ClientEvent::TrackEnded { track });
                            }
                        }
                        PeerEvent::LocalCandidate(candidate) => {
                            if let Err(error) =
                                sender.send(&SignalingMessage::IceCandidate(candidate)).await
                            {
                                break SessionEnd::Lost { error, was_connected: connected };
                            }
                        }
                        PeerEvent::StateChanged(PeerState::Connected) => {
                            if !connected {
                                connected = true;
                                info!("Media connected to {}", self.url);
                                self.shared.set_state(ConnectionState::Connected);
                            }
                        }
                        PeerEvent::StateChanged(state) if state.is_terminal() => {
                            break SessionEnd::Lost {
                                error: TeleviewError::Transport {
                                    reason: format!("media connection {:?}", state),
                                },
                                was_connected: connected,
                            };
                        }
                        PeerEvent::StateChanged(state) => {
                            debug!("Media peer state {:?}", state);
                        }
                    }
                }

                _ = stats_timer.tick() => {
                    let inbound = peer.inbound_stats().await;
                    let stats = local_stats(&inbound, &mut estimator, registry.active());
                    self.shared.emit_local_stats(stats);
                }

                _ = &mut connect_deadline, if !connected => {
                    break SessionEnd::Lost {
                        error: TeleviewError::Timeout {
                            operation: "media connection".to_string(),
                            duration: connect_timeout,
                        },
                        was_connected: false,
                    };
                }
            }
        };

        if matches!(end, SessionEnd::Shutdown) {
            if let Err(e) = sender.send(&SignalingMessage::Bye).await {
                debug!("Could not send bye: {}", e);
            }
        }
        if let Err(e) = sender.close().await {
            debug!("Signaling close: {}", e);
        }
        if let Err(e) = peer.close().await {
            debug!("Peer close: {}", e);
        }
        for track in registry.end_all() {
            self.shared.emit(ClientEvent::TrackEnded { track });
        }

        end
    }

    async fn handle_response(
        &self,
        response: SignalingResponse,
        peer: &dyn MediaPeer,
        sender: &mut SignalingSender,
        registry: &TrackRegistry,
    ) -> Result<(), TeleviewError> {
        match response {
            SignalingResponse::Offer { sdp } => {
                debug!("Received offer ({} bytes)", sdp.len());
                let answer = peer.accept_offer(sdp).await?;
                sender.send(&SignalingMessage::Answer { sdp: answer }).await?;
            }
            SignalingResponse::IceCandidate(candidate) => {
                if let Err(e) = peer.add_remote_candidate(candidate).await {
                    warn!("Rejected remote ICE candidate: {}", e);
                }
            }
            SignalingResponse::Stats(stats) => {
                self.shared.emit(ClientEvent::Stats {
                    stats: server_stats(&stats, registry.active()),
                });
            }
            SignalingResponse::Error { error, error_code } => {
                warn!("Signaling server error {}: {}", error_code, error);
                self.shared
                    .emit_error(TeleviewError::Remote { error, error_code });
            }
        }
        Ok(())
    }
}

fn local_stats(
    inbound: &InboundStats,
    estimator: &mut BitrateEstimator,
    active_tracks: usize,
) -> LinkStats {
    LinkStats {
        source: StatsSource::Local,
        timestamp: Utc::now(),
        bitrate_kbps: estimator.update(inbound.bytes_received),
        rtt_ms: inbound.rtt_ms,
        bytes_received: inbound.bytes_received,
        packets_received: inbound.packets_received,
        packets_lost: inbound.packets_lost,
        active_tracks,
    }
}

fn server_stats(stats: &ServerStats, active_tracks: usize) -> LinkStats {
    LinkStats {
        source: StatsSource::Server,
        timestamp: Utc::now(),
        bitrate_kbps: stats.bitrate_kbps.unwrap_or(0.0),
        rtt_ms: stats.rtt_ms,
        bytes_received: 0,
        packets_received: 0,
        packets_lost: stats.packets_lost,
        active_tracks: stats.tracks.unwrap_or(active_tracks),
    }
}
