//! Display surfaces that show one video track at a time

use parking_lot::RwLock;
use teleview_core::Pose;
use teleview_media::MediaTrack;

/// A target the router pushes tracks into and the binder poses.
///
/// Implementations use interior mutability; the router and binder only hold
/// shared references.
pub trait DisplaySurface: Send + Sync {
    /// Stable identity used to key binder registrations
    fn id(&self) -> &str;

    /// Show `track`, superseding whatever was shown before
    fn set_video_track(&self, track: MediaTrack);

    /// Currently shown track
    fn current_track(&self) -> Option<MediaTrack>;

    /// Full pose
    fn pose(&self) -> Pose;

    /// Replace the full pose
    fn set_pose(&self, pose: Pose);

    /// Move the surface, keeping its orientation
    fn set_position(&self, x: f32, y: f32, z: f32) {
        self.set_pose(self.pose().with_position(x, y, z));
    }
}

#[derive(Debug)]
struct PanelState {
    track: Option<MediaTrack>,
    pose: Pose,
    visible: bool,
}

/// In-memory video panel
#[derive(Debug)]
pub struct VideoPanel {
    id: String,
    state: RwLock<PanelState>,
}

impl VideoPanel {
    /// Create a visible panel at the identity pose
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_pose(id, Pose::identity())
    }

    /// Create a visible panel at `pose`
    pub fn with_pose(id: impl Into<String>, pose: Pose) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(PanelState {
                track: None,
                pose,
                visible: true,
            }),
        }
    }

    /// Show or hide the panel
    pub fn set_visible(&self, visible: bool) {
        self.state.write().visible = visible;
    }

    /// Check if the panel is shown
    pub fn is_visible(&self) -> bool {
        self.state.read().visible
    }

    /// ID of the current track, if any
    pub fn current_track_id(&self) -> Option<String> {
        self.state
            .read()
            .track
            .as_ref()
            .map(|track| track.id().to_string())
    }
}

impl DisplaySurface for VideoPanel {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_video_track(&self, track: MediaTrack) {
        tracing::debug!(
            "Panel {} now shows track {:?} (ordinal {})",
            self.id,
            track.id(),
            track.ordinal()
        );
        self.state.write().track = Some(track);
    }

    fn current_track(&self) -> Option<MediaTrack> {
        self.state.read().track.clone()
    }

    fn pose(&self) -> Pose {
        self.state.read().pose
    }

    fn set_pose(&self, pose: Pose) {
        self.state.write().pose = pose;
    }
}
