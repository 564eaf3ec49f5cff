//! Presentation snapshots
//!
//! Plain copies of what the UI needs, published at a throttled cadence so
//! the presentation layer doesn't redraw at simulation rate.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::{RunEnd, RunStats};
use crate::enemy::EnemyKind;
use crate::input::Gesture;
use crate::phase::{HelpState, Phase};
use crate::weapon::WeaponState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresentationSnapshot {
    pub at_ms: f64,
    pub phase: Phase,
    pub calibration_progress: f32,
    pub pause_progress: f32,
    pub weapon: WeaponState,
    pub help: HelpState,
    pub showcase: Option<EnemyKind>,
    pub left_tracked: bool,
    pub right_tracked: bool,
    pub cursor: Vec2,
    pub gesture: Gesture,
    pub stats: RunStats,
    pub finished: Option<RunEnd>,
}

/// Rate limiter for snapshot publication
#[derive(Debug, Clone, Copy)]
pub struct SnapshotThrottle {
    interval_ms: f64,
    last_at_ms: Option<f64>,
}

impl SnapshotThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_at_ms: None,
        }
    }

    /// True when a snapshot should go out at `now_ms`; arms the next window.
    pub fn ready(&mut self, now_ms: f64) -> bool {
        let due = self
            .last_at_ms
            .is_none_or(|last| now_ms - last >= self.interval_ms);
        if due {
            self.last_at_ms = Some(now_ms);
        }
        due
    }

    /// Make the next `ready` call succeed (e.g. after a phase change)
    pub fn force(&mut self) {
        self.last_at_ms = None;
    }
}
