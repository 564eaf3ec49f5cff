//! Cursor projection and stability detection

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Sub-rectangle of the camera image that maps onto the full screen.
///
/// Hands rarely reach the image edges, so a smaller pad lets the user cover
/// the whole play area with comfortable motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualPad {
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Default for VirtualPad {
    fn default() -> Self {
        Self {
            origin: Vec2::new(0.2, 0.2),
            width: 0.6,
            height: 0.6,
        }
    }
}

impl VirtualPad {
    /// Position inside the pad, unclamped, in pad units
    #[inline]
    pub fn normalize(&self, tip: Vec3) -> Vec2 {
        let size = Vec2::new(self.width.max(f32::EPSILON), self.height.max(f32::EPSILON));
        (tip.truncate() - self.origin) / size
    }

    /// Map a fingertip to [0,1]^2, re-centered so the calibrated resting
    /// position lands at (0.5, 0.5)
    pub fn project(&self, tip: Vec3, calibration_offset: Vec2) -> Vec2 {
        (self.normalize(tip) - calibration_offset + Vec2::splat(0.5)).clamp(Vec2::ZERO, Vec2::ONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Max per-frame smoothed cursor movement (normalized units)
    pub smoothed_tolerance: f32,
    /// Max per-frame raw cursor movement (normalized units)
    pub raw_tolerance: f32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            smoothed_tolerance: 0.015,
            raw_tolerance: 0.03,
        }
    }
}

/// Tracks the previous cursor pair to judge frame-to-frame stability
#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityTracker {
    prev: Option<(Vec2, Vec2)>,
}

impl StabilityTracker {
    /// Both the smoothed and the raw delta must be inside their tolerance.
    /// The first sample after a reset is never stable.
    pub fn update(&mut self, smoothed: Vec2, raw: Vec2, config: &StabilityConfig) -> bool {
        let stable = match self.prev {
            Some((prev_smoothed, prev_raw)) => {
                smoothed.distance(prev_smoothed) <= config.smoothed_tolerance
                    && raw.distance(prev_raw) <= config.raw_tolerance
            }
            None => false,
        };
        self.prev = Some((smoothed, raw));
        stable
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}
