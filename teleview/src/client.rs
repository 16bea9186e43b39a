//! Video ingest client and builder

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::event::{ClientEvent, EventStream};
use crate::session::{SessionShared, SessionTask};
use std::sync::Arc;
use std::time::Duration;
use teleview_core::TeleviewError;
use teleview_diagnostics::{LinkStats, StatsSource};
use teleview_media::{MediaTrack, PeerFactory, WebRtcPeerFactory};
use teleview_signaling::{endpoint_for_page, parse_signaling_url};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// How long a client-owned runtime waits for the session teardown
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection state of the ingest client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session; either not started yet or lost and not being retried
    Disconnected,
    /// Signaling or media negotiation in progress
    Connecting,
    /// Media is flowing
    Connected,
    /// Shut down; terminal
    Closed,
}

type StatsCallback = Box<dyn FnMut(&LinkStats) + Send>;
type TrackCallback = Box<dyn FnMut(MediaTrack, &str) + Send>;
type ErrorCallback = Box<dyn FnMut(&TeleviewError) + Send>;
type StateCallback = Box<dyn FnMut(ConnectionState) + Send>;

#[derive(Default)]
struct Callbacks {
    on_stats: Option<StatsCallback>,
    on_track: Option<TrackCallback>,
    on_error: Option<ErrorCallback>,
    on_state: Option<StateCallback>,
}

/// Fluent builder for ingest client configuration and connection
pub struct VideoClientBuilder {
    config: ClientConfig,
    callbacks: Callbacks,
    factory: Option<Arc<dyn PeerFactory>>,
}

impl std::fmt::Debug for VideoClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoClientBuilder")
            .field("config", &self.config)
            .field("custom_peer_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for VideoClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoClientBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Start from `config`
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            callbacks: Callbacks::default(),
            factory: None,
        }
    }

    /// Set the signaling WebSocket URL
    pub fn signaling_url(mut self, url: &str) -> Self {
        self.config.signaling_url = Some(url.to_string());
        self
    }

    /// Derive the signaling URL from the hosting page's URL
    pub fn page_url(mut self, url: &str) -> Self {
        self.config.page_url = Some(url.to_string());
        self
    }

    /// Bound the signaling handshake and media connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the local stats sampling interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.config.stats_interval = interval;
        self
    }

    /// Set the reconnection policy
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    /// Add a STUN/TURN server URL
    pub fn ice_server(mut self, url: &str) -> Self {
        self.config.ice_servers.push(url.to_string());
        self
    }

    /// Use a custom media peer implementation
    pub fn peer_factory(mut self, factory: Arc<dyn PeerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Called with every stats sample
    pub fn on_stats<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&LinkStats) + Send + 'static,
    {
        self.callbacks.on_stats = Some(Box::new(callback));
        self
    }

    /// Called once per newly observed inbound track with its ID
    pub fn on_track<F>(mut self, callback: F) -> Self
    where
        F: FnMut(MediaTrack, &str) + Send + 'static,
    {
        self.callbacks.on_track = Some(Box::new(callback));
        self
    }

    /// Called with every reported error
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&TeleviewError) + Send + 'static,
    {
        self.callbacks.on_error = Some(Box::new(callback));
        self
    }

    /// Called on every connection state change
    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(ConnectionState) + Send + 'static,
    {
        self.callbacks.on_state = Some(Box::new(callback));
        self
    }

    fn resolve_endpoint(&self) -> Result<Url, TeleviewError> {
        match (&self.config.signaling_url, &self.config.page_url) {
            (Some(url), _) => parse_signaling_url(url),
            (None, Some(page)) => endpoint_for_page(page),
            (None, None) => Err(TeleviewError::MissingConfiguration {
                field: "signaling_url".to_string(),
            }),
        }
    }

    /// Start the client.
    ///
    /// The session runs on the ambient tokio runtime if there is one,
    /// otherwise on a runtime owned by the client.
    pub fn connect(self) -> Result<VideoClient, TeleviewError> {
        let url = self.resolve_endpoint()?;

        let (runtime, handle) = match tokio::runtime::Handle::try_current() {
            Ok(handle) => (None, handle),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .thread_name("teleview-ingest")
                    .enable_all()
                    .build()
                    .map_err(|e| TeleviewError::Initialization {
                        reason: format!("Failed to create async runtime: {}", e),
                    })?;
                let handle = runtime.handle().clone();
                (Some(runtime), handle)
            }
        };

        let factory: Arc<dyn PeerFactory> = match self.factory {
            Some(factory) => factory,
            None => Arc::new(WebRtcPeerFactory::new(self.config.ice_servers.clone())),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SessionShared::new(event_tx));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let client_id = format!("viewer-{}", Uuid::new_v4());

        info!("Starting ingest client {} for {}", client_id, url);
        shared.set_state(ConnectionState::Connecting);

        let task = SessionTask {
            config: self.config,
            url: url.clone(),
            client_id: client_id.clone(),
            factory,
            shared: shared.clone(),
            shutdown: shutdown_rx,
        };
        let task = handle.spawn(task.run());

        Ok(VideoClient {
            client_id,
            endpoint: url,
            shared,
            events: event_rx,
            callbacks: self.callbacks,
            subscribers: Vec::new(),
            shutdown: shutdown_tx,
            task: Some(task),
            runtime,
        })
    }
}

/// Receive-only video client.
///
/// Network work happens on a background task; callbacks run only inside
/// [`VideoClient::dispatch`], on the caller's thread, in the order the events
/// occurred.
pub struct VideoClient {
    client_id: String,
    endpoint: Url,
    shared: Arc<SessionShared>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    callbacks: Callbacks,
    subscribers: Vec<mpsc::UnboundedSender<ClientEvent>>,
    shutdown: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
    runtime: Option<tokio::runtime::Runtime>,
}

impl std::fmt::Debug for VideoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoClient")
            .field("client_id", &self.client_id)
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl VideoClient {
    /// Connect to `signaling_url` with a stats callback and a track callback
    pub fn new<S, T>(signaling_url: &str, on_stats: S, on_track: T) -> Result<Self, TeleviewError>
    where
        S: FnMut(&LinkStats) + Send + 'static,
        T: FnMut(MediaTrack, &str) + Send + 'static,
    {
        Self::builder()
            .signaling_url(signaling_url)
            .on_stats(on_stats)
            .on_track(on_track)
            .connect()
    }

    /// Create a builder
    pub fn builder() -> VideoClientBuilder {
        VideoClientBuilder::new()
    }

    /// Client ID announced to the server
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Signaling endpoint in use
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Check if the client has been shut down
    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Subscribe to every event delivered by [`dispatch`](Self::dispatch)
    pub fn events(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        EventStream::new(rx)
    }

    /// Deliver queued events to the callbacks and event subscribers;
    /// returns how many were delivered.
    ///
    /// Call once per frame from the host loop. Delivers nothing once the
    /// client is closed.
    pub fn dispatch(&mut self) -> usize {
        let mut delivered = 0;

        while !self.is_closed() {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(_) => break,
            };

            // Only the newest of several queued local samples is delivered
            if let ClientEvent::Stats { stats } = &event {
                if stats.source == StatsSource::Local && !self.shared.local_stats_dequeued() {
                    continue;
                }
            }

            self.deliver(&event);
            self.subscribers
                .retain(|subscriber| subscriber.send(event.clone()).is_ok());
            delivered += 1;
        }

        delivered
    }

    fn deliver(&mut self, event: &ClientEvent) {
        let callbacks = &mut self.callbacks;
        match event {
            ClientEvent::StateChanged { state } => {
                if let Some(on_state) = callbacks.on_state.as_mut() {
                    on_state(*state);
                }
            }
            ClientEvent::TrackReceived { track } => {
                if let Some(on_track) = callbacks.on_track.as_mut() {
                    on_track(track.clone(), track.id());
                }
            }
            ClientEvent::Stats { stats } => {
                if let Some(on_stats) = callbacks.on_stats.as_mut() {
                    on_stats(stats);
                }
            }
            ClientEvent::Error { error } => {
                if let Some(on_error) = callbacks.on_error.as_mut() {
                    on_error(error.as_ref());
                }
            }
            ClientEvent::TrackEnded { .. } | ClientEvent::Reconnecting { .. } => {}
        }
    }

    /// Close the signaling socket and media peer.
    ///
    /// Queued and future events are discarded; no callback fires after this
    /// returns. On a client-owned runtime this blocks until the session has
    /// sent `bye` and closed the peer, bounded by a short timeout. On an
    /// ambient runtime use [`close`](Self::close) to wait for the teardown.
    pub fn shutdown(&mut self) {
        if self.shared.set_state(ConnectionState::Closed) {
            info!("Shutting down ingest client {}", self.client_id);
        }
        let _ = self.shutdown.send(true);
        while self.events.try_recv().is_ok() {}
        self.subscribers.clear();
        self.await_owned_teardown();
    }

    /// Block on the session task when it runs on the client's own runtime
    fn await_owned_teardown(&mut self) {
        let runtime = match self.runtime.as_ref() {
            Some(runtime) => runtime,
            None => return,
        };
        // block_on is not allowed from inside an async context
        if tokio::runtime::Handle::try_current().is_ok() {
            return;
        }
        if let Some(task) = self.task.take() {
            if runtime
                .block_on(tokio::time::timeout(TEARDOWN_TIMEOUT, task))
                .is_err()
            {
                warn!(
                    "Ingest session teardown for {} exceeded {:?}",
                    self.client_id, TEARDOWN_TIMEOUT
                );
            }
        }
    }

    /// Shut down and wait for the background task to finish its teardown
    pub async fn close(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for VideoClient {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        self.await_owned_teardown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
