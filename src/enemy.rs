//! Enemy archetypes
//!
//! A closed set of kinds. Stats and motion are matched exhaustively so a new
//! archetype cannot be added without deciding how it behaves everywhere.

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Slow bobbing flyer
    Drone,
    /// Fast, weaving, fragile
    Swarmer,
    /// Slow, heavily armored
    Brute,
    /// Breaks into two swarmers on death
    Splitter,
}

/// Static per-kind stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub max_hp: f32,
    pub hit_radius: f32,
    pub speed: f32,
    pub points: u32,
    /// Damage dealt to the player on breach
    pub breach_damage: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Drone,
        EnemyKind::Swarmer,
        EnemyKind::Brute,
        EnemyKind::Splitter,
    ];

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Drone => EnemyStats {
                max_hp: 30.0,
                hit_radius: 0.6,
                speed: 2.5,
                points: 100,
                breach_damage: 1,
            },
            EnemyKind::Swarmer => EnemyStats {
                max_hp: 10.0,
                hit_radius: 0.4,
                speed: 5.0,
                points: 50,
                breach_damage: 1,
            },
            EnemyKind::Brute => EnemyStats {
                max_hp: 120.0,
                hit_radius: 1.1,
                speed: 1.2,
                points: 400,
                breach_damage: 3,
            },
            EnemyKind::Splitter => EnemyStats {
                max_hp: 45.0,
                hit_radius: 0.8,
                speed: 2.0,
                points: 200,
                breach_damage: 2,
            },
        }
    }

    /// Velocity at `time_secs`, given the heading toward the player.
    /// `phase_offset` de-synchronizes enemies of the same kind.
    pub fn velocity(self, heading: Vec3, time_secs: f32, phase_offset: f32) -> Vec3 {
        let speed = self.stats().speed;
        let t = time_secs + phase_offset;
        match self {
            EnemyKind::Drone => heading * speed + Vec3::Y * (t * 2.0).sin() * 0.8,
            EnemyKind::Swarmer => heading * speed + Vec3::X * (t * 6.0).sin() * 3.0,
            EnemyKind::Brute => heading * speed,
            EnemyKind::Splitter => {
                heading * speed + Vec3::new((t * 1.5).cos(), (t * 1.5).sin(), 0.0) * 1.2
            }
        }
    }

    /// Kinds spawned in place when this one dies
    pub fn fragments(self) -> &'static [EnemyKind] {
        match self {
            EnemyKind::Splitter => &[EnemyKind::Swarmer, EnemyKind::Swarmer],
            EnemyKind::Drone | EnemyKind::Swarmer | EnemyKind::Brute => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Drone => "Drone",
            EnemyKind::Swarmer => "Swarmer",
            EnemyKind::Brute => "Brute",
            EnemyKind::Splitter => "Splitter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brute_moves_straight() {
        let heading = Vec3::new(0.0, 0.0, 1.0);
        let v = EnemyKind::Brute.velocity(heading, 3.7, 0.4);
        assert_eq!(v, heading * EnemyKind::Brute.stats().speed);
    }

    #[test]
    fn test_only_splitter_fragments() {
        for kind in EnemyKind::ALL {
            let expected = matches!(kind, EnemyKind::Splitter);
            assert_eq!(!kind.fragments().is_empty(), expected, "{}", kind.name());
        }
    }
}
