//! Configuration types and defaults

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff for re-establishing a lost session
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Attempts allowed after a session is lost; 0 disables reconnection
    pub max_attempts: u32,
    /// Delay before the first attempt
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
    /// Random spread applied to each delay, as a fraction (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            jitter: 0.2,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay before `attempt` (1-based) without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Delay before `attempt` (1-based) with jitter applied
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }

        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        base.mul_f64(factor).min(self.max_backoff)
    }
}

/// Video ingest client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit signaling WebSocket URL
    pub signaling_url: Option<String>,
    /// Hosting page URL the signaling endpoint is derived from when no
    /// explicit URL is set
    pub page_url: Option<String>,
    /// Bound on the signaling handshake and on reaching a connected media
    /// session
    pub connect_timeout: Duration,
    /// Interval between local stats samples
    pub stats_interval: Duration,
    /// Reconnection behavior
    pub reconnect: ReconnectPolicy,
    /// STUN/TURN server URLs
    pub ice_servers: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: None,
            page_url: None,
            connect_timeout: Duration::from_secs(10),
            stats_interval: Duration::from_secs(1),
            reconnect: ReconnectPolicy::default(),
            ice_servers: Vec::new(),
        }
    }
}
