//! Track-to-surface routing

use crate::surface::DisplaySurface;
use std::sync::Arc;
use teleview_media::MediaTrack;
use tracing::{debug, warn};

/// Which surfaces a track was pushed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteDecision {
    /// Shown on the primary surface
    pub primary: bool,
    /// Shown on the left surface
    pub left: bool,
    /// Shown on the right surface
    pub right: bool,
}

impl RouteDecision {
    /// Decide the targets for the track with arrival `ordinal` and `track_id`.
    ///
    /// The first track always lands on primary and left, the second on
    /// right. Any track whose ID contains `left` or `right` also lands on
    /// that side. Targets are not exclusive.
    pub fn decide(ordinal: u32, track_id: &str) -> Self {
        Self {
            primary: ordinal == 0,
            left: ordinal == 0 || track_id.contains("left"),
            right: ordinal == 1 || track_id.contains("right"),
        }
    }

    /// Check if the track reached no surface
    pub fn is_dropped(&self) -> bool {
        !(self.primary || self.left || self.right)
    }

    /// Number of surfaces the track was pushed to
    pub fn target_count(&self) -> usize {
        [self.primary, self.left, self.right]
            .iter()
            .filter(|hit| **hit)
            .count()
    }
}

/// Pushes arriving tracks into the primary, left and right surfaces
pub struct TrackRouter {
    primary: Arc<dyn DisplaySurface>,
    left: Arc<dyn DisplaySurface>,
    right: Arc<dyn DisplaySurface>,
}

impl std::fmt::Debug for TrackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackRouter")
            .field("primary", &self.primary.id())
            .field("left", &self.left.id())
            .field("right", &self.right.id())
            .finish()
    }
}

impl TrackRouter {
    /// Create a router over three surfaces
    pub fn new(
        primary: Arc<dyn DisplaySurface>,
        left: Arc<dyn DisplaySurface>,
        right: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            primary,
            left,
            right,
        }
    }

    /// Route `track`, using the client-assigned ordinal.
    ///
    /// Unmatched tracks past the second are dropped and logged.
    pub fn route(&self, track: &MediaTrack, track_id: &str) -> RouteDecision {
        let decision = RouteDecision::decide(track.ordinal(), track_id);

        if decision.primary {
            self.primary.set_video_track(track.clone());
        }
        if decision.left {
            self.left.set_video_track(track.clone());
        }
        if decision.right {
            self.right.set_video_track(track.clone());
        }

        if decision.is_dropped() {
            warn!(
                "No surface for track {:?} (ordinal {}), dropping",
                track_id,
                track.ordinal()
            );
        } else {
            debug!(
                "Routed track {:?} (ordinal {}) to {:?}",
                track_id,
                track.ordinal(),
                decision
            );
        }

        decision
    }
}
