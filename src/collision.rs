//! Continuous hit tests for fast projectiles
//!
//! Projectiles are tested along the segment from their previous to their
//! current position, so a target thinner than one frame of travel is still hit.
//! Everything compares squared distances; no square roots on the hot path.

use glam::{Vec2, Vec3};

/// Segments shorter than this are treated as points
const DEGENERATE_LEN_SQ: f32 = 1.0e-10;

/// Closest point on segment `start..end` to `point`
#[inline]
pub fn closest_point_on_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq < DEGENERATE_LEN_SQ {
        return start;
    }
    // Clamp so the closest point lies on the segment, not its infinite line
    let t = ((point - start).dot(seg) / len_sq).clamp(0.0, 1.0);
    start + seg * t
}

/// Does the swept segment `start..end` pass within `radius` of `center`?
pub fn segment_hits_sphere(start: Vec3, end: Vec3, center: Vec3, radius: f32) -> bool {
    let closest = closest_point_on_segment(start, end, center);
    closest.distance_squared(center) <= radius * radius
}

/// Planar variant used for menu targets in cursor space
pub fn segment_hits_circle(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> bool {
    let seg = end - start;
    let len_sq = seg.length_squared();
    let closest = if len_sq < DEGENERATE_LEN_SQ {
        start
    } else {
        let t = ((center - start).dot(seg) / len_sq).clamp(0.0, 1.0);
        start + seg * t
    };
    closest.distance_squared(center) <= radius * radius
}

/// Sphere overlap, used for area munition blasts
#[inline]
pub fn spheres_overlap(a: Vec3, ra: f32, b: Vec3, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}
