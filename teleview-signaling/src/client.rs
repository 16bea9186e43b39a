//! WebSocket signaling client

use crate::protocol::{SignalingMessage, SignalingResponse};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use teleview_core::TeleviewError;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

/// WebSocket connection wrapper
type WebSocketConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Signaling connection to the video server
#[derive(Debug)]
pub struct SignalingClient {
    sender: SignalingSender,
    receiver: SignalingReceiver,
}

impl SignalingClient {
    /// Open the signaling socket, waiting at most `timeout` for the handshake
    pub async fn connect(url: &Url, timeout: Duration) -> Result<Self, TeleviewError> {
        let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TeleviewError::Timeout {
                operation: format!("signaling connect to {}", url),
                duration: timeout,
            })?
            .map_err(|e| TeleviewError::SignalingConnection {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Signaling connection established to {}", url);

        let (sink, stream) = ws_stream.split();
        Ok(Self {
            sender: SignalingSender {
                url: url.clone(),
                sink,
            },
            receiver: SignalingReceiver {
                url: url.clone(),
                stream,
            },
        })
    }

    /// Send a message to the server
    pub async fn send(&mut self, message: &SignalingMessage) -> Result<(), TeleviewError> {
        self.sender.send(message).await
    }

    /// Wait for the next server message; `None` once the socket is closed
    pub async fn next_response(&mut self) -> Option<Result<SignalingResponse, TeleviewError>> {
        self.receiver.next_response().await
    }

    /// Split into independently usable send and receive halves
    pub fn into_split(self) -> (SignalingSender, SignalingReceiver) {
        (self.sender, self.receiver)
    }
}

/// Sending half of a signaling connection
pub struct SignalingSender {
    url: Url,
    sink: SplitSink<WebSocketConnection, Message>,
}

impl std::fmt::Debug for SignalingSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingSender")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl SignalingSender {
    /// Send a message to the server
    pub async fn send(&mut self, message: &SignalingMessage) -> Result<(), TeleviewError> {
        let json = serde_json::to_string(message).map_err(|e| TeleviewError::InvalidMessage {
            message: format!("{:?}", message),
            source: e.into(),
        })?;

        self.sink
            .send(Message::Text(json))
            .await
            .map_err(|e| TeleviewError::SignalingConnection {
                url: self.url.to_string(),
                reason: format!("send failed: {}", e),
            })
    }

    /// Send a close frame and flush
    pub async fn close(&mut self) -> Result<(), TeleviewError> {
        self.sink
            .close()
            .await
            .map_err(|e| TeleviewError::SignalingConnection {
                url: self.url.to_string(),
                reason: format!("close failed: {}", e),
            })
    }
}

/// Receiving half of a signaling connection
pub struct SignalingReceiver {
    url: Url,
    stream: SplitStream<WebSocketConnection>,
}

impl std::fmt::Debug for SignalingReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingReceiver")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl SignalingReceiver {
    /// Wait for the next server message; `None` once the socket is closed.
    ///
    /// Undecodable text frames are returned as errors without ending the
    /// stream; control and binary frames are skipped.
    pub async fn next_response(&mut self) -> Option<Result<SignalingResponse, TeleviewError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Some(
                        serde_json::from_str::<SignalingResponse>(&text).map_err(|e| {
                            TeleviewError::InvalidMessage {
                                message: text,
                                source: e.into(),
                            }
                        }),
                    );
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("Signaling connection {} closed: {:?}", self.url, frame);
                    return None;
                }
                Some(Err(e)) => {
                    return Some(Err(TeleviewError::SignalingConnection {
                        url: self.url.to_string(),
                        reason: e.to_string(),
                    }));
                }
                None => {
                    tracing::debug!("Signaling connection {} stream ended", self.url);
                    return None;
                }
                _ => {
                    // Ignore other message types (Binary, Ping, Pong)
                }
            }
        }
    }
}
