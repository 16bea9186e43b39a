//! Integration tests for track admission
//!
//! These tests exercise the registry the way the ingest session does:
//! - duplicate reports from the media stack
//! - admission from several tasks at once
//! - teardown at the end of a session

use std::collections::HashSet;
use std::sync::Arc;

use teleview_media::{IncomingTrack, MediaTrack, TrackRegistry};

#[tokio::test]
async fn test_concurrent_admission_assigns_unique_ordinals() {
    let registry = Arc::new(TrackRegistry::new(7));

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            // Every key is reported twice
            let first = registry.admit(IncomingTrack::new(format!("ssrc-{}", i), ""));
            let second = registry.admit(IncomingTrack::new(format!("ssrc-{}", i), ""));
            (first, second)
        }));
    }

    let mut admitted = Vec::new();
    for handle in handles {
        let (first, second) = handle.await.unwrap();
        assert!(second.is_none());
        admitted.push(first.unwrap());
    }

    let ordinals: HashSet<u32> = admitted.iter().map(MediaTrack::ordinal).collect();
    assert_eq!(ordinals.len(), 16);
    assert!(ordinals.iter().all(|o| *o < 16));
    assert!(admitted.iter().all(|t| t.session() == 7));
    assert_eq!(registry.len(), 16);
}

#[test]
fn test_surface_handles_observe_session_teardown() {
    let registry = TrackRegistry::new(1);
    let head = registry.admit(IncomingTrack::new("1", "")).unwrap();
    let right = registry
        .admit(IncomingTrack::new("2", "controller-right-cam"))
        .unwrap();

    // Surfaces keep clones after the registry is torn down
    let on_left = head.clone();
    let on_right = right.clone();

    let ended = registry.end_all();
    assert_eq!(ended, vec![head, right]);
    assert!(on_left.is_ended());
    assert!(on_right.is_ended());
    assert_eq!(registry.active(), 0);
}

#[test]
fn test_new_session_restarts_ordinals() {
    let first_session = TrackRegistry::new(1);
    first_session.admit(IncomingTrack::new("1", "left"));
    first_session.admit(IncomingTrack::new("2", "right"));
    first_session.end_all();

    let second_session = TrackRegistry::new(2);
    let again = second_session
        .admit(IncomingTrack::new("1", "left"))
        .unwrap();

    assert_eq!(again.ordinal(), 0);
    assert_ne!(Some(again), first_session.get("1"));
}
