//! Per-frame binding of display surfaces to late-resolving anchors
//!
//! Anchors such as a controller's ray space only exist once an immersive
//! session is running, so the binder holds (surface, resolver) pairs and
//! re-resolves every anchor on each [`SpatialBinder::tick`]. A surface whose
//! anchor is absent keeps its last pose and picks tracking back up on the
//! first frame the anchor resolves, without re-registration.

use crate::surface::DisplaySurface;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use teleview_core::{Pose, TeleviewError};
use tracing::{debug, warn};

/// A resolved spatial anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pose: Pose,
}

impl Anchor {
    /// Anchor at `pose`
    pub fn new(pose: Pose) -> Self {
        Self { pose }
    }

    /// Pose of the anchor for the current frame
    pub fn current_pose(&self) -> Pose {
        self.pose
    }
}

impl From<Pose> for Anchor {
    fn from(pose: Pose) -> Self {
        Self::new(pose)
    }
}

/// Pull-based anchor lookup, invoked once per tick.
///
/// Return `None` while the anchor is unavailable rather than panicking. A
/// panic is contained and counts as absent for the frame, but the process
/// panic hook still runs for it on every tick.
pub trait AnchorResolver: Send + Sync {
    /// The anchor, or `None` while it does not exist yet
    fn resolve(&self) -> Option<Anchor>;
}

impl<F> AnchorResolver for F
where
    F: Fn() -> Option<Anchor> + Send + Sync,
{
    fn resolve(&self) -> Option<Anchor> {
        self()
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Registrations whose anchor resolved and whose surface was posed
    pub updated: usize,
    /// Registrations whose anchor was absent
    pub held: usize,
    /// Registrations whose resolver panicked, treated as absent
    pub failed: usize,
}

impl TickReport {
    /// Total registrations processed
    pub fn processed(&self) -> usize {
        self.updated + self.held + self.failed
    }
}

struct AnchorRegistration {
    surface: Arc<dyn DisplaySurface>,
    resolver: Arc<dyn AnchorResolver>,
    last_known_pose: Option<Pose>,
    failing: bool,
}

/// Holds surface registrations and poses them once per rendered frame
#[derive(Default)]
pub struct SpatialBinder {
    registrations: Mutex<Vec<AnchorRegistration>>,
}

impl std::fmt::Debug for SpatialBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registrations = self.registrations.lock();
        let surfaces: Vec<&str> = registrations.iter().map(|r| r.surface.id()).collect();
        f.debug_struct("SpatialBinder")
            .field("surfaces", &surfaces)
            .finish()
    }
}

impl SpatialBinder {
    /// Create an empty binder
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `surface` to `resolver`.
    ///
    /// Registering a surface that is already bound replaces its resolver and
    /// keeps its last known pose.
    pub fn register_panel_with_getter<R>(&self, surface: Arc<dyn DisplaySurface>, resolver: R)
    where
        R: AnchorResolver + 'static,
    {
        let resolver: Arc<dyn AnchorResolver> = Arc::new(resolver);
        let mut registrations = self.registrations.lock();

        if let Some(existing) = registrations
            .iter_mut()
            .find(|r| r.surface.id() == surface.id())
        {
            debug!("Replacing anchor resolver for surface {}", surface.id());
            existing.surface = surface;
            existing.resolver = resolver;
        } else {
            debug!("Registered surface {} with the binder", surface.id());
            registrations.push(AnchorRegistration {
                surface,
                resolver,
                last_known_pose: None,
                failing: false,
            });
        }
    }

    /// Remove the registration for `surface_id`; returns whether one existed
    pub fn unregister(&self, surface_id: &str) -> bool {
        let mut registrations = self.registrations.lock();
        let before = registrations.len();
        registrations.retain(|r| r.surface.id() != surface_id);
        registrations.len() != before
    }

    /// Last pose written to `surface_id` by the binder
    pub fn last_known_pose(&self, surface_id: &str) -> Option<Pose> {
        self.registrations
            .lock()
            .iter()
            .find(|r| r.surface.id() == surface_id)
            .and_then(|r| r.last_known_pose)
    }

    /// Check if `surface_id` is registered
    pub fn is_registered(&self, surface_id: &str) -> bool {
        self.registrations
            .lock()
            .iter()
            .any(|r| r.surface.id() == surface_id)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.lock().is_empty()
    }

    /// Resolve every anchor once and pose the surfaces whose anchor exists.
    ///
    /// Resolvers run without the registration lock held, so they may call
    /// back into the binder; such changes take effect on the next tick.
    pub fn tick(&self) -> TickReport {
        let snapshot: Vec<(Arc<dyn DisplaySurface>, Arc<dyn AnchorResolver>, bool)> = self
            .registrations
            .lock()
            .iter()
            .map(|r| (r.surface.clone(), r.resolver.clone(), r.failing))
            .collect();

        let mut report = TickReport::default();
        let mut outcomes = Vec::with_capacity(snapshot.len());

        for (surface, resolver, was_failing) in snapshot {
            let outcome = match catch_unwind(AssertUnwindSafe(|| resolver.resolve())) {
                Ok(Some(anchor)) => {
                    let pose = anchor.current_pose();
                    surface.set_pose(pose);
                    report.updated += 1;
                    ResolveOutcome::Posed(pose)
                }
                Ok(None) => {
                    report.held += 1;
                    ResolveOutcome::Absent
                }
                Err(panic) => {
                    let failure = TeleviewError::ResolverFailure {
                        surface_id: surface.id().to_string(),
                        reason: panic_message(panic.as_ref()),
                    };
                    // Warn once per failure streak
                    if was_failing {
                        debug!("{}; holding last pose", failure);
                    } else {
                        warn!("{}; holding last pose until it recovers", failure);
                    }
                    report.failed += 1;
                    ResolveOutcome::Failed
                }
            };
            outcomes.push((surface, resolver, outcome));
        }

        let mut registrations = self.registrations.lock();
        for (surface, resolver, outcome) in outcomes {
            // Skip registrations replaced or removed during the pass
            if let Some(registration) = registrations.iter_mut().find(|r| {
                r.surface.id() == surface.id() && Arc::ptr_eq(&r.resolver, &resolver)
            }) {
                if let ResolveOutcome::Posed(pose) = outcome {
                    registration.last_known_pose = Some(pose);
                }
                registration.failing = matches!(outcome, ResolveOutcome::Failed);
            }
        }

        report
    }
}

enum ResolveOutcome {
    Posed(Pose),
    Absent,
    Failed,
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "resolver panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::VideoPanel;

    #[test]
    fn test_reregistration_replaces_resolver() {
        let binder = SpatialBinder::new();
        let panel: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("left"));

        binder.register_panel_with_getter(panel.clone(), || {
            Some(Anchor::new(Pose::from_position(1.0, 0.0, 0.0)))
        });
        binder.register_panel_with_getter(panel.clone(), || {
            Some(Anchor::new(Pose::from_position(2.0, 0.0, 0.0)))
        });

        assert_eq!(binder.len(), 1);
        let report = binder.tick();
        assert_eq!(report.updated, 1);
        assert_eq!(panel.pose().position.x, 2.0);
        assert_eq!(
            binder.last_known_pose("left"),
            Some(Pose::from_position(2.0, 0.0, 0.0))
        );
    }

    #[test]
    fn test_unregister_stops_updates() {
        let binder = SpatialBinder::new();
        let panel: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("right"));
        binder.register_panel_with_getter(panel.clone(), || {
            Some(Anchor::new(Pose::from_position(0.0, 1.0, 0.0)))
        });

        assert!(binder.unregister("right"));
        assert!(!binder.unregister("right"));
        assert!(binder.is_empty());

        assert_eq!(binder.tick().processed(), 0);
        assert_eq!(panel.pose(), Pose::identity());
    }

    #[test]
    fn test_failure_streak_is_tracked_until_recovery() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let binder = SpatialBinder::new();
        let panel: Arc<dyn DisplaySurface> = Arc::new(VideoPanel::new("left"));
        let broken = Arc::new(AtomicBool::new(true));
        let flag = broken.clone();
        binder.register_panel_with_getter(panel.clone(), move || -> Option<Anchor> {
            if flag.load(Ordering::SeqCst) {
                panic!("ray space lost");
            }
            Some(Anchor::new(Pose::from_position(0.5, 0.0, 0.0)))
        });
        let failing = |binder: &SpatialBinder| binder.registrations.lock()[0].failing;

        assert!(!failing(&binder));
        assert_eq!(binder.tick().failed, 1);
        assert!(failing(&binder));
        assert_eq!(binder.tick().failed, 1);
        assert!(failing(&binder));

        broken.store(false, Ordering::SeqCst);
        assert_eq!(binder.tick().updated, 1);
        assert!(!failing(&binder));
        assert_eq!(
            binder.last_known_pose("left"),
            Some(Pose::from_position(0.5, 0.0, 0.0))
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("no controller");
        assert_eq!(panic_message(boxed.as_ref()), "no controller");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("xr lost"));
        assert_eq!(panic_message(boxed.as_ref()), "xr lost");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "resolver panicked");
    }
}
