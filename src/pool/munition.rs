//! Area munitions: lobbed, gravity-affected, detonate on fuse or ground

use glam::Vec3;

use super::{Handle, Pool};
use crate::frame::FrameContext;
use crate::scene::{Archetype, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Munition {
    pub position: Vec3,
    pub prev_position: Vec3,
    pub velocity: Vec3,
    pub start_time_ms: f64,
    pub fuse_ms: f64,
    pub blast_radius: f32,
    pub damage: f32,
    /// Set by the combat pass when the munition touches an enemy
    pub triggered: bool,
}

impl Munition {
    fn idle() -> Self {
        Self {
            position: Vec3::ZERO,
            prev_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            start_time_ms: 0.0,
            fuse_ms: 0.0,
            blast_radius: 0.0,
            damage: 0.0,
            triggered: false,
        }
    }
}

/// Blast produced when a munition goes off
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    pub position: Vec3,
    pub radius: f32,
    pub damage: f32,
}

#[derive(Debug, Clone)]
pub struct MunitionPool {
    pool: Pool<Munition>,
    gravity: f32,
    ground_y: f32,
    scale: f32,
}

impl MunitionPool {
    pub fn new(gravity: f32, ground_y: f32, scale: f32) -> Self {
        Self {
            pool: Pool::new(Archetype::Munition),
            gravity,
            ground_y,
            scale,
        }
    }

    pub fn prewarm(&mut self, count: usize, scene: &mut dyn SceneGraph) {
        self.pool.prewarm(count, scene, Munition::idle);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        scene: &mut dyn SceneGraph,
        origin: Vec3,
        velocity: Vec3,
        now_ms: f64,
        fuse_ms: f64,
        blast_radius: f32,
        damage: f32,
    ) -> Handle {
        let handle = self.pool.spawn(
            scene,
            Munition {
                position: origin,
                prev_position: origin,
                velocity,
                start_time_ms: now_ms,
                fuse_ms,
                blast_radius,
                damage,
                triggered: false,
            },
        );
        if let Some(node) = self.pool.node(handle) {
            scene.set_transform(node, origin, self.scale);
        }
        handle
    }

    /// Mark a munition to detonate on the next update
    pub fn trigger(&mut self, handle: Handle) {
        if let Some(m) = self.pool.get_mut(handle) {
            m.triggered = true;
        }
    }

    /// Advance munitions; finished ones are deactivated and their blasts
    /// appended to `detonations`.
    pub fn update(
        &mut self,
        ctx: &FrameContext,
        scene: &mut dyn SceneGraph,
        detonations: &mut Vec<Detonation>,
    ) {
        let dt = ctx.sim_dt_secs();
        let (gravity, ground_y, scale) = (self.gravity, self.ground_y, self.scale);
        self.pool.update_active(scene, |_, node, m, scene| {
            let fuse_done = ctx.now_ms - m.start_time_ms >= m.fuse_ms;
            if m.triggered || fuse_done {
                detonations.push(Detonation {
                    position: m.position,
                    radius: m.blast_radius,
                    damage: m.damage,
                });
                return false;
            }
            m.prev_position = m.position;
            m.velocity.y -= gravity * dt;
            m.position += m.velocity * dt;
            if m.position.y <= ground_y {
                m.position.y = ground_y;
                detonations.push(Detonation {
                    position: m.position,
                    radius: m.blast_radius,
                    damage: m.damage,
                });
                return false;
            }
            scene.set_transform(node, m.position, scale);
            true
        });
    }

    pub fn release_all(&mut self, scene: &mut dyn SceneGraph) {
        self.pool.release_all(scene);
    }

    pub fn get(&self, handle: Handle) -> Option<&Munition> {
        self.pool.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Munition)> {
        self.pool.iter_active()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;

    fn ctx(now_ms: f64) -> FrameContext {
        FrameContext {
            delta_ms: 100.0,
            time_scale: 1.0,
            now_ms,
            interval_ms: 100.0,
        }
    }

    #[test]
    fn test_fuse_detonates() {
        let mut scene = RecordingScene::new();
        let mut pool = MunitionPool::new(0.0, -100.0, 0.3);
        pool.spawn(&mut scene, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, 0.0, 250.0, 3.0, 50.0);
        let mut blasts = Vec::new();
        pool.update(&ctx(100.0), &mut scene, &mut blasts);
        pool.update(&ctx(200.0), &mut scene, &mut blasts);
        assert!(blasts.is_empty());
        pool.update(&ctx(300.0), &mut scene, &mut blasts);
        assert_eq!(blasts.len(), 1);
        assert_eq!(blasts[0].radius, 3.0);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_ground_contact_detonates() {
        let mut scene = RecordingScene::new();
        let mut pool = MunitionPool::new(9.8, 0.0, 0.3);
        pool.spawn(&mut scene, Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -10.0, -5.0), 0.0, 10_000.0, 2.0, 10.0);
        let mut blasts = Vec::new();
        pool.update(&ctx(100.0), &mut scene, &mut blasts);
        assert_eq!(blasts.len(), 1);
        assert_eq!(blasts[0].position.y, 0.0);
    }

    #[test]
    fn test_trigger_detonates_next_update() {
        let mut scene = RecordingScene::new();
        let mut pool = MunitionPool::new(0.0, -100.0, 0.3);
        let h = pool.spawn(&mut scene, Vec3::ZERO, Vec3::ZERO, 0.0, 10_000.0, 2.0, 10.0);
        pool.trigger(h);
        let mut blasts = Vec::new();
        pool.update(&ctx(16.0), &mut scene, &mut blasts);
        assert_eq!(blasts.len(), 1);
        assert!(pool.get(h).is_none());
    }
}
