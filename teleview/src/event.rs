//! Event system for ingest client events

use crate::client::ConnectionState;
use std::sync::Arc;
use std::time::Duration;
use teleview_core::TeleviewError;
use teleview_diagnostics::LinkStats;
use teleview_media::MediaTrack;
use tokio::sync::mpsc;

/// Events produced by the ingest session, delivered in order by
/// [`VideoClient::dispatch`](crate::VideoClient::dispatch)
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Connection state changed
    StateChanged {
        /// New connection state
        state: ConnectionState,
    },
    /// A new inbound video track was admitted
    TrackReceived {
        /// The track that was received
        track: MediaTrack,
    },
    /// An inbound track ended
    TrackEnded {
        /// The track that ended
        track: MediaTrack,
    },
    /// A stats sample, polled locally or pushed by the server
    Stats {
        /// Link statistics
        stats: LinkStats,
    },
    /// An error occurred; the session may keep running
    Error {
        /// Error that occurred
        error: Arc<TeleviewError>,
    },
    /// A lost session is about to be re-established
    Reconnecting {
        /// Attempt number, starting at 1
        attempt: u32,
        /// Delay before the attempt
        delay: Duration,
    },
}

impl ClientEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::StateChanged { .. } => "state_changed",
            ClientEvent::TrackReceived { .. } => "track_received",
            ClientEvent::TrackEnded { .. } => "track_ended",
            ClientEvent::Stats { .. } => "stats",
            ClientEvent::Error { .. } => "error",
            ClientEvent::Reconnecting { .. } => "reconnecting",
        }
    }

    /// Check if this is a track-related event
    pub fn is_track_event(&self) -> bool {
        matches!(
            self,
            ClientEvent::TrackReceived { .. } | ClientEvent::TrackEnded { .. }
        )
    }

    /// Check if this is a connection-related event
    pub fn is_connection_event(&self) -> bool {
        matches!(
            self,
            ClientEvent::StateChanged { .. } | ClientEvent::Reconnecting { .. }
        )
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(self, ClientEvent::Error { .. })
    }
}

/// Stream of client events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<ClientEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<ClientEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<ClientEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Result<Option<ClientEvent>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(mpsc::error::TryRecvError::Disconnected)
            }
        }
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleview_media::IncomingTrack;

    #[test]
    fn test_event_classification() {
        let track = MediaTrack::new(IncomingTrack::new("1", ""), 0, 1);
        let received = ClientEvent::TrackReceived { track };
        assert_eq!(received.event_type(), "track_received");
        assert!(received.is_track_event());
        assert!(!received.is_connection_event());

        let reconnecting = ClientEvent::Reconnecting {
            attempt: 2,
            delay: Duration::from_secs(1),
        };
        assert!(reconnecting.is_connection_event());

        let error = ClientEvent::Error {
            error: Arc::new(TeleviewError::ReconnectExhausted { attempts: 5 }),
        };
        assert!(error.is_error_event());
        assert_eq!(error.event_type(), "error");
    }

    #[test]
    fn test_stream_reports_disconnect() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = EventStream::new(rx);

        assert!(matches!(stream.try_next(), Ok(None)));
        tx.send(ClientEvent::StateChanged {
            state: ConnectionState::Connecting,
        })
        .unwrap();
        assert!(matches!(
            stream.try_next(),
            Ok(Some(ClientEvent::StateChanged {
                state: ConnectionState::Connecting
            }))
        ));

        drop(tx);
        assert!(stream.try_next().is_err());
    }
}
