use std::sync::Arc;

use proptest::prelude::*;
use teleview::{DisplaySurface, IncomingTrack, MediaTrack, TrackRouter, VideoPanel};

struct Surfaces {
    primary: Arc<VideoPanel>,
    left: Arc<VideoPanel>,
    right: Arc<VideoPanel>,
    router: TrackRouter,
}

fn surfaces() -> Surfaces {
    let primary = Arc::new(VideoPanel::new("primary"));
    let left = Arc::new(VideoPanel::new("left"));
    let right = Arc::new(VideoPanel::new("right"));
    let router = TrackRouter::new(primary.clone(), left.clone(), right.clone());
    Surfaces {
        primary,
        left,
        right,
        router,
    }
}

fn route_all(surfaces: &Surfaces, ids: &[String]) -> Vec<MediaTrack> {
    ids.iter()
        .enumerate()
        .map(|(ordinal, id)| {
            let track = MediaTrack::new(
                IncomingTrack::new(format!("ssrc-{}", ordinal), id.as_str()),
                ordinal as u32,
                1,
            );
            surfaces.router.route(&track, id);
            track
        })
        .collect()
}

fn track_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("left".to_string()),
        Just("right".to_string()),
        "[a-z-]{0,16}",
    ]
}

proptest! {
    #[test]
    fn prop_primary_always_holds_first_track(
        ids in proptest::collection::vec(track_id(), 1..8)
    ) {
        let s = surfaces();
        let tracks = route_all(&s, &ids);

        prop_assert_eq!(s.primary.current_track(), Some(tracks[0].clone()));
    }

    #[test]
    fn prop_hint_free_ids_fill_left_then_right(
        ids in proptest::collection::vec("[a-eh-z0-9-]{0,12}", 2..6)
    ) {
        // Alphabet excludes 'f' and 'g', so neither hint can appear
        let s = surfaces();
        let tracks = route_all(&s, &ids);

        prop_assert_eq!(s.left.current_track(), Some(tracks[0].clone()));
        prop_assert_eq!(s.right.current_track(), Some(tracks[1].clone()));
    }

    #[test]
    fn prop_hinted_later_track_reaches_its_side(
        prefix in "[a-z]{0,6}",
        hint in prop_oneof![Just("left"), Just("right")],
        ordinal in 2u32..50
    ) {
        let s = surfaces();
        let id = format!("{}{}", prefix, hint);
        let track = MediaTrack::new(IncomingTrack::new("k", id.as_str()), ordinal, 1);

        let decision = s.router.route(&track, &id);

        prop_assert!(!decision.primary);
        if hint == "left" {
            prop_assert!(decision.left);
            prop_assert_eq!(s.left.current_track(), Some(track));
        } else {
            prop_assert!(decision.right);
            prop_assert_eq!(s.right.current_track(), Some(track));
        }
    }
}

#[test]
fn test_left_right_hints_on_first_two_tracks() {
    let s = surfaces();
    let tracks = route_all(&s, &["cam-left".to_string(), "cam-right".to_string()]);

    assert_eq!(s.primary.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.left.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.right.current_track(), Some(tracks[1].clone()));
}

#[test]
fn test_first_track_hinted_right_lands_on_both_sides() {
    let s = surfaces();
    let tracks = route_all(&s, &["right".to_string()]);

    assert_eq!(s.primary.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.left.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.right.current_track(), Some(tracks[0].clone()));
}

#[test]
fn test_third_unhinted_track_is_dropped() {
    let s = surfaces();
    let ids = vec![String::new(), String::new(), "overview".to_string()];
    let tracks = route_all(&s, &ids);

    assert_eq!(s.primary.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.left.current_track(), Some(tracks[0].clone()));
    assert_eq!(s.right.current_track(), Some(tracks[1].clone()));
}

#[test]
fn test_later_hint_supersedes_earlier_assignment() {
    let s = surfaces();
    let ids = vec![
        String::new(),
        String::new(),
        "wrist-left".to_string(),
    ];
    let tracks = route_all(&s, &ids);

    assert_eq!(s.left.current_track(), Some(tracks[2].clone()));
    assert_eq!(s.primary.current_track(), Some(tracks[0].clone()));
    assert!(!tracks[0].is_ended());
}
