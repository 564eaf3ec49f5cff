//! Headless driver
//!
//! Runs the kernel against a recording scene and a simulated 144Hz display,
//! feeding a scripted hand: hold still to calibrate, pinch to start, sweep
//! and fire for a while, then close a fist to pause. Snapshots are logged as
//! JSON.
//!
//! Usage: `gesture-strike [config.json] [seconds]`

use glam::Vec3;

use gesture_strike::frame::ManualHost;
use gesture_strike::input::landmarks::{INDEX_TIP, LANDMARK_COUNT, THUMB_TIP, WRIST};
use gesture_strike::input::{Handedness, LandmarkFrame, VisionMessage};
use gesture_strike::scene::RecordingScene;
use gesture_strike::{FrameScheduler, Game, GameConfig};

/// Simulated display refresh interval
const REFRESH_MS: f64 = 1000.0 / 144.0;
/// Vision inference cadence
const VISION_MS: f64 = 1000.0 / 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pose {
    Open,
    Pinch,
    Fist,
}

/// Procedural hand: wrist below, fingers fanned upward, the whole hand
/// offset by `shift`
fn hand(pose: Pose, shift: Vec3) -> Vec<Vec3> {
    let wrist = Vec3::new(0.5, 0.8, 0.0);
    let mut points = vec![wrist; LANDMARK_COUNT];
    for finger in 0..5 {
        let spread = (finger as f32 - 2.0) * 0.06;
        let mcp = wrist + Vec3::new(spread, -0.2, 0.0);
        let tip = match pose {
            Pose::Open | Pose::Pinch => mcp + Vec3::new(spread * 0.5, -0.2, 0.0),
            Pose::Fist => wrist + Vec3::new(spread * 0.5, -0.08, 0.0),
        };
        for joint in 0..4 {
            points[1 + finger * 4 + joint] = mcp.lerp(tip, joint as f32 / 3.0);
        }
    }
    points[THUMB_TIP] = match pose {
        Pose::Open => wrist + Vec3::new(-0.25, -0.1, 0.0),
        Pose::Fist => wrist + Vec3::new(-0.14, -0.12, 0.0),
        Pose::Pinch => points[INDEX_TIP],
    };
    points[WRIST] = wrist;
    points.iter().map(|p| *p + shift).collect()
}

/// Scripted performance for time `t` (ms)
fn script(t: f64) -> (Pose, Vec3) {
    let secs = t / 1000.0;
    match secs {
        s if s < 2.5 => (Pose::Open, Vec3::ZERO),
        s if s < 3.0 => (Pose::Pinch, Vec3::ZERO),
        s if s < 12.0 => {
            let sweep = (s as f32 * 1.3).sin() * 0.08;
            // Pinch-and-hold fires; open every other second to reload edges
            let pose = if (s as u32) % 2 == 0 { Pose::Pinch } else { Pose::Open };
            (pose, Vec3::new(sweep, 0.0, 0.0))
        }
        _ => (Pose::Fist, Vec3::ZERO),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => GameConfig::load(&path)?,
        _ => GameConfig::default(),
    };
    let seconds: f64 = args.next().map(|s| s.parse::<f64>()).transpose()?.unwrap_or(15.0);

    log::info!("Gesture Strike (headless) starting, {seconds:.0}s simulated");

    let mut scheduler = FrameScheduler::new(config.loop_config);
    let (mut game, vision) = Game::new(config, RecordingScene::new());
    let snapshots = game.subscribe_snapshots();
    let mut host = ManualHost::new();

    let end_ms = seconds * 1000.0;
    let mut now = 0.0;
    let mut next_vision = 0.0;
    scheduler.start(&mut host, now);

    while now < end_ms && host.has_pending() {
        now += REFRESH_MS;
        if now >= next_vision {
            let (pose, shift) = script(now);
            vision.send(VisionMessage::Hand(LandmarkFrame::new(
                now,
                Handedness::Right,
                hand(pose, shift),
            )));
            next_vision += VISION_MS;
        }
        scheduler.on_animation_frame(now, &mut host, &mut game);

        for snapshot in snapshots.drain() {
            log::debug!("{}", serde_json::to_string(&snapshot)?);
        }
    }
    scheduler.stop(&mut host);

    let final_snapshot = game.snapshot(now);
    let scene = game.scene();
    log::info!(
        "Finished in {:?}: {} frames admitted, {} nodes created, {} attached",
        final_snapshot.phase,
        scheduler.admitted_frames(),
        scene.created(),
        scene.attached_count()
    );
    println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    Ok(())
}

