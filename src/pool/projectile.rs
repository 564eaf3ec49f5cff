//! Primary-fire projectiles
//!
//! Each tick stores the pre-move position so hit tests can sweep the
//! `prev_position..position` segment for this tick only.

use glam::Vec3;

use super::{Handle, Pool};
use crate::frame::FrameContext;
use crate::scene::{Archetype, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub position: Vec3,
    pub prev_position: Vec3,
    pub velocity: Vec3,
    pub start_time_ms: f64,
    pub lifetime_ms: f64,
    pub damage: f32,
}

impl Projectile {
    fn idle() -> Self {
        Self {
            position: Vec3::ZERO,
            prev_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            start_time_ms: 0.0,
            lifetime_ms: 0.0,
            damage: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectilePool {
    pool: Pool<Projectile>,
    scale: f32,
}

impl ProjectilePool {
    pub fn new(scale: f32) -> Self {
        Self {
            pool: Pool::new(Archetype::Projectile),
            scale,
        }
    }

    pub fn prewarm(&mut self, count: usize, scene: &mut dyn SceneGraph) {
        self.pool.prewarm(count, scene, Projectile::idle);
    }

    pub fn spawn(
        &mut self,
        scene: &mut dyn SceneGraph,
        origin: Vec3,
        velocity: Vec3,
        now_ms: f64,
        lifetime_ms: f64,
        damage: f32,
    ) -> Handle {
        let handle = self.pool.spawn(
            scene,
            Projectile {
                position: origin,
                prev_position: origin,
                velocity,
                start_time_ms: now_ms,
                lifetime_ms,
                damage,
            },
        );
        if let Some(node) = self.pool.node(handle) {
            scene.set_transform(node, origin, self.scale);
        }
        handle
    }

    /// Advance every live projectile and expire those past their lifetime
    /// or matching `should_deactivate`.
    pub fn update(
        &mut self,
        ctx: &FrameContext,
        scene: &mut dyn SceneGraph,
        mut should_deactivate: impl FnMut(&Projectile) -> bool,
    ) {
        let dt = ctx.sim_dt_secs();
        let scale = self.scale;
        self.pool.update_active(scene, |_, node, p, scene| {
            p.prev_position = p.position;
            p.position += p.velocity * dt;
            if ctx.now_ms - p.start_time_ms >= p.lifetime_ms || should_deactivate(p) {
                return false;
            }
            scene.set_transform(node, p.position, scale);
            true
        });
    }

    pub fn release(&mut self, handle: Handle, scene: &mut dyn SceneGraph) -> bool {
        self.pool.release(handle, scene)
    }

    pub fn release_all(&mut self, scene: &mut dyn SceneGraph) {
        self.pool.release_all(scene);
    }

    pub fn get(&self, handle: Handle) -> Option<&Projectile> {
        self.pool.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Projectile)> {
        self.pool.iter_active()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }
}
