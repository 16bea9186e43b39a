//! Inbound track abstractions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use webrtc::track::track_remote::TrackRemote;

/// A remote track as reported by the media peer, before the client has
/// admitted it
#[derive(Clone)]
pub struct IncomingTrack {
    /// Key unique within one peer connection (SSRC for WebRTC peers)
    pub key: String,
    /// Server-assigned track ID, possibly empty
    pub id: String,
    /// Media stream the track belongs to
    pub stream_id: String,
    /// Codec MIME type, e.g. `video/H264`
    pub mime_type: String,
    /// Underlying WebRTC track, absent for synthetic tracks
    pub remote: Option<Arc<TrackRemote>>,
}

impl IncomingTrack {
    /// Create a track description without a WebRTC backing track
    pub fn new(key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: id.into(),
            stream_id: String::new(),
            mime_type: String::new(),
            remote: None,
        }
    }

    /// Describe a WebRTC remote track
    pub fn from_remote(remote: Arc<TrackRemote>) -> Self {
        Self {
            key: remote.ssrc().to_string(),
            id: remote.id(),
            stream_id: remote.stream_id(),
            mime_type: remote.codec().capability.mime_type,
            remote: Some(remote),
        }
    }

    /// Set the media stream ID
    pub fn with_stream_id(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = stream_id.into();
        self
    }
}

impl std::fmt::Debug for IncomingTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingTrack")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("mime_type", &self.mime_type)
            .field("has_remote", &self.remote.is_some())
            .finish()
    }
}

/// Handle to one live inbound video stream.
///
/// Cheap to clone; display surfaces hold clones without owning the stream's
/// lifecycle. Two handles are equal when they refer to the same track of the
/// same session.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

struct TrackInner {
    incoming: IncomingTrack,
    ordinal: u32,
    session: u64,
    received_at: Instant,
    ended: AtomicBool,
}

impl MediaTrack {
    /// Admit an incoming track with its arrival ordinal within `session`
    pub fn new(incoming: IncomingTrack, ordinal: u32, session: u64) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                incoming,
                ordinal,
                session,
                received_at: Instant::now(),
                ended: AtomicBool::new(false),
            }),
        }
    }

    /// Server-assigned track ID, possibly empty
    pub fn id(&self) -> &str {
        &self.inner.incoming.id
    }

    /// Peer-unique key
    pub fn key(&self) -> &str {
        &self.inner.incoming.key
    }

    /// Media stream ID
    pub fn stream_id(&self) -> &str {
        &self.inner.incoming.stream_id
    }

    /// Codec MIME type
    pub fn mime_type(&self) -> &str {
        &self.inner.incoming.mime_type
    }

    /// 0-based arrival order within the session
    pub fn ordinal(&self) -> u32 {
        self.inner.ordinal
    }

    /// Session generation the track was negotiated in
    pub fn session(&self) -> u64 {
        self.inner.session
    }

    /// Underlying WebRTC track for RTP consumers
    pub fn remote(&self) -> Option<&Arc<TrackRemote>> {
        self.inner.incoming.remote.as_ref()
    }

    /// When the track was admitted
    pub fn received_at(&self) -> Instant {
        self.inner.received_at
    }

    /// How long the track has been live
    pub fn reception_duration(&self) -> Duration {
        self.inner.received_at.elapsed()
    }

    /// Check if the track has ended
    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::Acquire)
    }

    /// Mark the track ended; returns false if it already was
    pub fn mark_ended(&self) -> bool {
        !self.inner.ended.swap(true, Ordering::AcqRel)
    }
}

impl PartialEq for MediaTrack {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.session == other.inner.session
                && self.inner.incoming.key == other.inner.incoming.key)
    }
}

impl Eq for MediaTrack {}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id())
            .field("key", &self.key())
            .field("ordinal", &self.ordinal())
            .field("session", &self.session())
            .field("ended", &self.is_ended())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_accessors() {
        let incoming = IncomingTrack::new("1234", "wrist-left").with_stream_id("cams");
        let track = MediaTrack::new(incoming, 0, 1);

        assert_eq!(track.id(), "wrist-left");
        assert_eq!(track.key(), "1234");
        assert_eq!(track.stream_id(), "cams");
        assert_eq!(track.ordinal(), 0);
        assert_eq!(track.session(), 1);
        assert!(track.remote().is_none());
        assert!(!track.is_ended());
    }

    #[test]
    fn test_clones_share_ended_state() {
        let track = MediaTrack::new(IncomingTrack::new("1", ""), 0, 1);
        let held_by_surface = track.clone();

        assert!(track.mark_ended());
        assert!(held_by_surface.is_ended());
        assert!(!held_by_surface.mark_ended());
    }

    #[test]
    fn test_equality_is_per_session() {
        let a = MediaTrack::new(IncomingTrack::new("42", "head"), 0, 1);
        let same = MediaTrack::new(IncomingTrack::new("42", "head"), 0, 1);
        let next_session = MediaTrack::new(IncomingTrack::new("42", "head"), 0, 2);

        assert_eq!(a, a.clone());
        assert_eq!(a, same);
        assert_ne!(a, next_session);
    }
}
