//! Discrete gesture classification
//!
//! Distances are normalized by the hand's bounding-box diagonal so the
//! thresholds hold regardless of how far the hand is from the camera.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::landmarks::{FINGER_TIPS, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP, WRIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gesture {
    Pinch,
    Fist,
    /// Least actionable; also the fail-closed result
    #[default]
    Palm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb/index tip distance (normalized) below which we call a pinch
    pub pinch_threshold: f32,
    /// Mean fingertip/wrist distance (normalized) below which we call a fist
    pub fist_threshold: f32,
    /// Classify from raw landmarks when available (lower edge latency)
    pub prefer_raw_for_edges: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.2,
            fist_threshold: 0.55,
            prefer_raw_for_edges: true,
        }
    }
}

/// Diagonal of the 2D bounding box around all points
fn bbox_diagonal(points: &[Vec3]) -> f32 {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for p in points {
        min = min.min(p.truncate());
        max = max.max(p.truncate());
    }
    (max - min).length()
}

/// Classify a landmark set. Anything malformed classifies as `Palm`.
pub fn classify_gesture(points: &[Vec3], config: &GestureConfig) -> Gesture {
    if points.len() < LANDMARK_COUNT || points.iter().any(|p| !p.is_finite()) {
        return Gesture::Palm;
    }
    let points = &points[..LANDMARK_COUNT];
    let diag = bbox_diagonal(points);
    if diag <= f32::EPSILON {
        return Gesture::Palm;
    }

    let pinch = points[THUMB_TIP].truncate().distance(points[INDEX_TIP].truncate()) / diag;
    if pinch < config.pinch_threshold {
        return Gesture::Pinch;
    }

    let wrist = points[WRIST].truncate();
    let curl = FINGER_TIPS
        .iter()
        .map(|&tip| points[tip].truncate().distance(wrist) / diag)
        .sum::<f32>()
        / FINGER_TIPS.len() as f32;
    if curl < config.fist_threshold {
        return Gesture::Fist;
    }

    Gesture::Palm
}

/// Pick the landmark set used for discrete gestures.
///
/// Smoothing steadies the cursor but delays pinch/fist edges, so raw points
/// win when they are present and enabled.
pub fn classify_dual(smoothed: &[Vec3], raw: Option<&[Vec3]>, config: &GestureConfig) -> Gesture {
    match raw {
        Some(raw) if config.prefer_raw_for_edges => classify_gesture(raw, config),
        _ => classify_gesture(smoothed, config),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Canonical hand poses in normalized image space
    use glam::Vec3;

    use super::super::landmarks::{LANDMARK_COUNT, Landmarks};

    /// Build a hand from wrist + five (mcp, tip) finger pairs. Intermediate
    /// joints are interpolated.
    fn hand(wrist: (f32, f32), fingers: [((f32, f32), (f32, f32)); 5]) -> Landmarks {
        let mut pts = [Vec3::ZERO; LANDMARK_COUNT];
        pts[0] = Vec3::new(wrist.0, wrist.1, 0.0);
        for (f, (mcp, tip)) in fingers.iter().enumerate() {
            let base = 1 + f * 4;
            let mcp = Vec3::new(mcp.0, mcp.1, 0.0);
            let tip = Vec3::new(tip.0, tip.1, 0.0);
            pts[base] = mcp;
            pts[base + 1] = mcp.lerp(tip, 1.0 / 3.0);
            pts[base + 2] = mcp.lerp(tip, 2.0 / 3.0);
            pts[base + 3] = tip;
        }
        pts
    }

    pub fn open_palm() -> Landmarks {
        hand(
            (0.5, 0.8),
            [
                ((0.42, 0.72), (0.30, 0.62)),
                ((0.45, 0.60), (0.43, 0.40)),
                ((0.50, 0.59), (0.50, 0.38)),
                ((0.55, 0.60), (0.57, 0.40)),
                ((0.59, 0.62), (0.63, 0.45)),
            ],
        )
    }

    pub fn pinch() -> Landmarks {
        hand(
            (0.5, 0.8),
            [
                ((0.42, 0.72), (0.43, 0.52)),
                ((0.45, 0.60), (0.43, 0.51)),
                ((0.50, 0.59), (0.50, 0.38)),
                ((0.55, 0.60), (0.57, 0.40)),
                ((0.59, 0.62), (0.63, 0.45)),
            ],
        )
    }

    pub fn fist() -> Landmarks {
        hand(
            (0.5, 0.8),
            [
                ((0.42, 0.72), (0.36, 0.64)),
                ((0.45, 0.62), (0.47, 0.72)),
                ((0.50, 0.61), (0.50, 0.71)),
                ((0.55, 0.62), (0.54, 0.72)),
                ((0.59, 0.64), (0.57, 0.73)),
            ],
        )
    }

    /// Shift every point (for motion fixtures)
    pub fn shifted(mut pts: Landmarks, dx: f32, dy: f32) -> Landmarks {
        for p in &mut pts {
            p.x += dx;
            p.y += dy;
        }
        pts
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_open_palm_is_palm() {
        assert_eq!(classify_gesture(&open_palm(), &GestureConfig::default()), Gesture::Palm);
    }

    #[test]
    fn test_pinch_fixture_is_pinch() {
        assert_eq!(classify_gesture(&pinch(), &GestureConfig::default()), Gesture::Pinch);
    }

    #[test]
    fn test_fist_fixture_is_fist() {
        assert_eq!(classify_gesture(&fist(), &GestureConfig::default()), Gesture::Fist);
    }

    #[test]
    fn test_classification_is_scale_invariant() {
        let cfg = GestureConfig::default();
        let mut small = pinch();
        for p in &mut small {
            *p = (*p - Vec3::new(0.5, 0.8, 0.0)) * 0.3 + Vec3::new(0.5, 0.8, 0.0);
        }
        assert_eq!(classify_gesture(&small, &cfg), Gesture::Pinch);
    }

    #[test]
    fn test_malformed_fails_closed_to_palm() {
        let cfg = GestureConfig::default();
        assert_eq!(classify_gesture(&fist()[..12], &cfg), Gesture::Palm);
        assert_eq!(classify_gesture(&[Vec3::ZERO; LANDMARK_COUNT], &cfg), Gesture::Palm);
        let mut nan = pinch();
        nan[7].y = f32::NAN;
        assert_eq!(classify_gesture(&nan, &cfg), Gesture::Palm);
    }

    #[test]
    fn test_dual_path_prefers_raw() {
        let cfg = GestureConfig::default();
        let raw = pinch();
        assert_eq!(classify_dual(&open_palm(), Some(&raw[..]), &cfg), Gesture::Pinch);
        let smoothed_only = GestureConfig { prefer_raw_for_edges: false, ..cfg };
        assert_eq!(classify_dual(&open_palm(), Some(&raw[..]), &smoothed_only), Gesture::Palm);
        assert_eq!(classify_dual(&open_palm(), None, &cfg), Gesture::Palm);
    }
}
