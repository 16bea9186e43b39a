//! Frame-by-frame behavior of the spatial binder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use teleview::{Anchor, DisplaySurface, Pose, SpatialBinder, TickReport, VideoPanel};

/// Resolver whose answer the test changes between frames
#[derive(Clone, Default)]
struct ScriptedAnchor {
    next: Arc<Mutex<Option<Pose>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAnchor {
    fn set(&self, pose: Option<Pose>) {
        *self.next.lock() = pose;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn resolver(&self) -> impl Fn() -> Option<Anchor> + Send + Sync + 'static {
        let next = self.next.clone();
        let calls = self.calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let pose = *next.lock();
            pose.map(Anchor::new)
        }
    }
}

fn panel(id: &str) -> Arc<VideoPanel> {
    Arc::new(VideoPanel::with_pose(id, Pose::from_position(0.0, 1.5, -1.0)))
}

#[test]
fn test_same_resolver_result_gives_same_pose() {
    let binder = SpatialBinder::new();
    let surface = panel("left");
    let anchor = ScriptedAnchor::default();
    anchor.set(Some(Pose::from_position(0.2, 1.1, -0.4)));
    binder.register_panel_with_getter(surface.clone(), anchor.resolver());

    binder.tick();
    let first = surface.pose();
    binder.tick();
    let second = surface.pose();

    assert_eq!(first, second);
    assert_eq!(first, Pose::from_position(0.2, 1.1, -0.4));
}

#[test]
fn test_absent_frame_holds_last_pose() {
    let binder = SpatialBinder::new();
    let surface = panel("right");
    let anchor = ScriptedAnchor::default();
    binder.register_panel_with_getter(surface.clone(), anchor.resolver());

    let frame1 = Pose::from_position(1.0, 1.0, 1.0);
    let frame3 = Pose::from_position(2.0, 2.0, 2.0);

    anchor.set(Some(frame1));
    binder.tick();
    assert_eq!(surface.pose(), frame1);

    anchor.set(None);
    let report = binder.tick();
    assert_eq!(report.held, 1);
    assert_eq!(surface.pose(), frame1);
    assert_eq!(binder.last_known_pose("right"), Some(frame1));

    anchor.set(Some(frame3));
    binder.tick();
    assert_eq!(surface.pose(), frame3);
    assert_eq!(binder.last_known_pose("right"), Some(frame3));
}

#[test]
fn test_late_anchor_is_picked_up_without_reregistration() {
    let binder = SpatialBinder::new();
    let initial = Pose::from_position(0.0, 1.5, -1.0);
    let surface = panel("left");
    let anchor = ScriptedAnchor::default();
    binder.register_panel_with_getter(surface.clone(), anchor.resolver());

    for _ in 1..=5 {
        binder.tick();
        assert_eq!(surface.pose(), initial);
    }
    assert!(binder.last_known_pose("left").is_none());

    let p = Pose::from_position(-0.3, 0.9, -0.5);
    anchor.set(Some(p));
    for _ in 6..=8 {
        binder.tick();
        assert_eq!(surface.pose(), p);
    }
    assert_eq!(anchor.calls(), 8);
}

#[test]
fn test_panicking_resolver_does_not_abort_pass() {
    let binder = SpatialBinder::new();
    let broken = panel("broken");
    let healthy = panel("healthy");
    let target = Pose::from_position(3.0, 0.0, 0.0);

    binder.register_panel_with_getter(broken.clone(), || -> Option<Anchor> {
        panic!("controller space unavailable")
    });
    binder.register_panel_with_getter(healthy.clone(), move || Some(Anchor::new(target)));

    let report = binder.tick();

    assert_eq!(
        report,
        TickReport {
            updated: 1,
            held: 0,
            failed: 1,
        }
    );
    assert_eq!(broken.pose(), Pose::from_position(0.0, 1.5, -1.0));
    assert_eq!(healthy.pose(), target);
}

#[test]
fn test_every_registration_processed_once_per_tick() {
    let binder = SpatialBinder::new();
    let anchors: Vec<ScriptedAnchor> = (0..4).map(|_| ScriptedAnchor::default()).collect();
    for (i, anchor) in anchors.iter().enumerate() {
        binder.register_panel_with_getter(panel(&format!("panel-{}", i)), anchor.resolver());
    }
    anchors[1].set(Some(Pose::identity()));

    for _ in 0..3 {
        let report = binder.tick();
        assert_eq!(report.processed(), 4);
    }
    assert!(anchors.iter().all(|a| a.calls() == 3));
}

#[test]
fn test_resolver_may_register_during_tick() {
    let binder = Arc::new(SpatialBinder::new());
    let late = panel("late");

    let binder_for_resolver = binder.clone();
    let late_for_resolver = late.clone();
    binder.register_panel_with_getter(panel("spawner"), move || -> Option<Anchor> {
        if !binder_for_resolver.is_registered("late") {
            binder_for_resolver.register_panel_with_getter(late_for_resolver.clone(), || {
                Some(Anchor::new(Pose::from_position(5.0, 5.0, 5.0)))
            });
        }
        None
    });

    assert_eq!(binder.tick().processed(), 1);
    assert_eq!(binder.len(), 2);
    assert_eq!(binder.tick().updated, 1);
    assert_eq!(late.pose(), Pose::from_position(5.0, 5.0, 5.0));
}
