//! Structured logging setup

use teleview_core::TeleviewError;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,webrtc=warn";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(default_filter: Option<&str>) -> Result<(), TeleviewError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter.unwrap_or(DEFAULT_LOG_FILTER)))
        .map_err(|e| TeleviewError::Initialization {
            reason: format!("Invalid log filter: {}", e),
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TeleviewError::Initialization {
            reason: format!("Failed to install tracing subscriber: {}", e),
        })
}
