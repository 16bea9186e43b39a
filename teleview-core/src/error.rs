//! Error types for Teleview

use std::time::Duration;
use thiserror::Error;

/// Main error type for Teleview operations
#[derive(Error, Debug)]
pub enum TeleviewError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// Signaling endpoint could not be derived or parsed
    #[error("Invalid signaling endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// Offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Signaling socket failed to open or dropped unexpectedly
    #[error("Signaling connection to {url} failed: {reason}")]
    SignalingConnection {
        /// Signaling endpoint URL
        url: String,
        /// Reason for connection failure
        reason: String,
    },

    /// Signaling socket closed by the remote side
    #[error("Signaling connection closed: {reason}")]
    SignalingClosed {
        /// Close reason reported by the server, if any
        reason: String,
    },

    /// Media handshake failed
    #[error("Media negotiation failed: {reason}")]
    Negotiation {
        /// Reason for negotiation failure
        reason: String,
    },

    /// Media transport error after negotiation
    #[error("Media transport error: {reason}")]
    Transport {
        /// Reason for transport error
        reason: String,
    },

    /// Server reported an error over signaling
    #[error("Signaling server error ({error_code}): {error}")]
    Remote {
        /// Error message from the server
        error: String,
        /// Error code from the server
        error_code: String,
    },

    /// Operation timed out error
    #[error("Operation timed out: {operation} after {duration:?}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Duration after which timeout occurred
        duration: Duration,
    },

    /// Reconnection budget spent
    #[error("Gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of attempts made
        attempts: u32,
    },

    /// Anchor resolver failed during a frame tick
    #[error("Anchor resolver for surface {surface_id} failed: {reason}")]
    ResolverFailure {
        /// Surface whose resolver failed
        surface_id: String,
        /// Failure description
        reason: String,
    },

    /// Invalid message format
    #[error("Invalid message format: {message}, error: {source}")]
    InvalidMessage {
        /// Invalid message content
        message: String,
        /// Parsing error
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TeleviewError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            TeleviewError::Initialization { .. } => "INITIALIZATION_FAILED".to_string(),
            TeleviewError::MissingConfiguration { .. } => "MISSING_CONFIGURATION".to_string(),
            TeleviewError::InvalidEndpoint { .. } => "INVALID_ENDPOINT".to_string(),
            TeleviewError::SignalingConnection { .. } => "SIGNALING_CONNECTION_FAILED".to_string(),
            TeleviewError::SignalingClosed { .. } => "SIGNALING_CLOSED".to_string(),
            TeleviewError::Negotiation { .. } => "NEGOTIATION_FAILED".to_string(),
            TeleviewError::Transport { .. } => "TRANSPORT_ERROR".to_string(),
            TeleviewError::Remote { .. } => "REMOTE_ERROR".to_string(),
            TeleviewError::Timeout { .. } => "TIMEOUT".to_string(),
            TeleviewError::ReconnectExhausted { .. } => "RECONNECT_EXHAUSTED".to_string(),
            TeleviewError::ResolverFailure { .. } => "RESOLVER_FAILURE".to_string(),
            TeleviewError::InvalidMessage { .. } => "INVALID_MESSAGE".to_string(),
        }
    }

    /// Whether a new session attempt may succeed after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TeleviewError::SignalingConnection { .. }
                | TeleviewError::SignalingClosed { .. }
                | TeleviewError::Negotiation { .. }
                | TeleviewError::Transport { .. }
                | TeleviewError::Remote { .. }
                | TeleviewError::Timeout { .. }
                | TeleviewError::InvalidMessage { .. }
        )
    }
}
