//! Per-session track bookkeeping

use crate::tracks::{IncomingTrack, MediaTrack};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// Admits inbound tracks for one peer session.
///
/// A media stack may report the same remote track more than once (for
/// example after renegotiation). Only the first report of a key is admitted
/// and receives the next ordinal.
#[derive(Debug)]
pub struct TrackRegistry {
    session: u64,
    next_ordinal: AtomicU32,
    tracks: DashMap<String, MediaTrack>,
}

impl TrackRegistry {
    /// Create an empty registry for `session`
    pub fn new(session: u64) -> Self {
        Self {
            session,
            next_ordinal: AtomicU32::new(0),
            tracks: DashMap::new(),
        }
    }

    /// Session generation this registry belongs to
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Admit a track, returning `None` if its key was already seen
    pub fn admit(&self, incoming: IncomingTrack) -> Option<MediaTrack> {
        match self.tracks.entry(incoming.key.clone()) {
            Entry::Occupied(_) => {
                debug!(
                    "Ignoring duplicate track report key={} id={:?}",
                    incoming.key, incoming.id
                );
                None
            }
            Entry::Vacant(slot) => {
                let ordinal = self.next_ordinal.fetch_add(1, Ordering::SeqCst);
                let track = MediaTrack::new(incoming, ordinal, self.session);
                slot.insert(track.clone());
                Some(track)
            }
        }
    }

    /// Look up an admitted track by key
    pub fn get(&self, key: &str) -> Option<MediaTrack> {
        self.tracks.get(key).map(|entry| entry.value().clone())
    }

    /// Mark a single track ended, returning it if it was live
    pub fn end(&self, key: &str) -> Option<MediaTrack> {
        let track = self.get(key)?;
        track.mark_ended().then_some(track)
    }

    /// Mark every live track ended, returning those that were live, in
    /// arrival order
    pub fn end_all(&self) -> Vec<MediaTrack> {
        let mut ended: Vec<MediaTrack> = self
            .tracks
            .iter()
            .filter(|entry| entry.value().mark_ended())
            .map(|entry| entry.value().clone())
            .collect();
        ended.sort_by_key(MediaTrack::ordinal);
        ended
    }

    /// Number of admitted tracks, ended or not
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if nothing has been admitted
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of tracks that have not ended
    pub fn active(&self) -> usize {
        self.tracks
            .iter()
            .filter(|entry| !entry.value().is_ended())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_admission_order() {
        let registry = TrackRegistry::new(1);

        let first = registry.admit(IncomingTrack::new("100", "")).unwrap();
        let second = registry
            .admit(IncomingTrack::new("200", "controller-right-cam"))
            .unwrap();

        assert_eq!(first.ordinal(), 0);
        assert_eq!(second.ordinal(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active(), 2);
    }

    #[test]
    fn test_duplicate_report_is_ignored() {
        let registry = TrackRegistry::new(1);

        assert!(registry.admit(IncomingTrack::new("100", "head")).is_some());
        assert!(registry.admit(IncomingTrack::new("100", "head")).is_none());

        let next = registry.admit(IncomingTrack::new("300", "")).unwrap();
        assert_eq!(next.ordinal(), 1);
    }

    #[test]
    fn test_end_all_reports_each_track_once() {
        let registry = TrackRegistry::new(3);
        registry.admit(IncomingTrack::new("a", "left"));
        registry.admit(IncomingTrack::new("b", "right"));

        assert!(registry.end("b").is_some());
        assert!(registry.end("b").is_none());

        let ended = registry.end_all();
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].key(), "a");
        assert_eq!(registry.active(), 0);
        assert!(registry.end_all().is_empty());
    }
}
