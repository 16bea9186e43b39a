//! Teleoperation Viewer Demo
//!
//! Wires the ingest client, the track router and the spatial binder into a
//! 72 Hz host loop. The left and right panels follow a simulated controller
//! that only becomes available two seconds in, the way a controller's ray
//! space appears once an immersive session has started.
//!
//! Usage: `cargo run --example teleop_viewer -- [signaling-url] [seconds]`

use std::sync::Arc;
use std::time::{Duration, Instant};

use teleview::{
    init_logging, Anchor, ConnectionState, DisplaySurface, Pose, Quat, SpatialBinder,
    TrackRouter, VideoClient, VideoPanel, Vec3,
};
use tracing::{info, warn};

const FRAME_RATE_HZ: u64 = 72;

/// Simulated controller pose, absent until `available_after` has elapsed
fn controller_anchor(started: Instant, available_after: Duration, side: f32) -> Option<Anchor> {
    let elapsed = started.elapsed();
    if elapsed < available_after {
        return None;
    }

    let sway = (elapsed.as_secs_f32() * 0.8).sin() * 0.05;
    Some(Anchor::new(Pose::new(
        Vec3::new(side * 0.25, 1.2 + sway, -0.4),
        Quat::from_rotation_y(-side * 0.3),
    )))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None)?;

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string());
    let run_for = Duration::from_secs(args.next().and_then(|s| s.parse().ok()).unwrap_or(30));

    info!("Teleop viewer connecting to {}", url);

    let primary = Arc::new(VideoPanel::with_pose("primary", Pose::from_position(0.0, 1.6, -2.0)));
    let left = Arc::new(VideoPanel::new("left"));
    let right = Arc::new(VideoPanel::new("right"));

    let router = TrackRouter::new(primary.clone(), left.clone(), right.clone());
    let mut client = VideoClient::builder()
        .signaling_url(&url)
        .ice_server("stun:stun.l.google.com:19302")
        .on_stats(|stats| {
            info!(
                "[{:?}] {:.0} kbps, rtt {:?} ms, quality {:?}",
                stats.source,
                stats.bitrate_kbps,
                stats.rtt_ms,
                stats.quality()
            );
        })
        .on_track(move |track, track_id| {
            let decision = router.route(&track, track_id);
            info!("Track {:?} -> {:?}", track_id, decision);
        })
        .on_error(|error| warn!("Ingest error [{}]: {}", error.error_code(), error))
        .on_state_change(|state| info!("Ingest state: {:?}", state))
        .connect()?;

    let started = Instant::now();
    let binder = SpatialBinder::new();
    binder.register_panel_with_getter(left.clone(), move || {
        controller_anchor(started, Duration::from_secs(2), -1.0)
    });
    binder.register_panel_with_getter(right.clone(), move || {
        controller_anchor(started, Duration::from_secs(2), 1.0)
    });

    let frame = Duration::from_micros(1_000_000 / FRAME_RATE_HZ);
    let mut frames: u64 = 0;

    while started.elapsed() < run_for && client.state() != ConnectionState::Closed {
        let frame_start = Instant::now();

        client.dispatch();
        let report = binder.tick();

        frames += 1;
        if frames % FRAME_RATE_HZ == 0 {
            info!(
                "frame {}: {} posed, {} waiting for anchors, left at {:?}",
                frames,
                report.updated,
                report.held + report.failed,
                left.pose().position
            );
        }

        if let Some(remaining) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!(
        "Shutting down after {} frames; primary shows {:?}",
        frames,
        primary.current_track_id()
    );
    client.shutdown();

    Ok(())
}
