//! Enemy actors
//!
//! `ActorFactory` keeps a free list of scene nodes per enemy kind and is
//! owned by the combat session (no global mesh cache). `EnemyRoster` is the
//! single owner of live enemies; removal is swap-and-pop so indices taken
//! during a collision pass stay dense.

use std::collections::HashMap;

use glam::Vec3;

use crate::enemy::EnemyKind;
use crate::scene::{Archetype, NodeId, SceneGraph};

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub node: NodeId,
    pub kind: EnemyKind,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit direction toward the player
    pub heading: Vec3,
    pub hp: f32,
    pub max_hp: f32,
    pub hit_radius: f32,
    pub points: u32,
    pub phase_offset: f32,
}

impl Enemy {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

#[derive(Debug, Default)]
pub struct ActorFactory {
    free: HashMap<EnemyKind, Vec<NodeId>>,
    created: usize,
}

impl ActorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prewarm(&mut self, kind: EnemyKind, count: usize, scene: &mut dyn SceneGraph) {
        let list = self.free.entry(kind).or_default();
        for _ in 0..count {
            list.push(scene.create(Archetype::Enemy(kind)));
            self.created += 1;
        }
    }

    /// Build an enemy on a pooled node (or a new one when the pool is empty)
    pub fn spawn(
        &mut self,
        scene: &mut dyn SceneGraph,
        kind: EnemyKind,
        position: Vec3,
        heading: Vec3,
        phase_offset: f32,
    ) -> Enemy {
        let node = match self.free.get_mut(&kind).and_then(Vec::pop) {
            Some(node) => node,
            None => {
                self.created += 1;
                log::debug!("Creating {} node ({} total)", kind.name(), self.created);
                scene.create(Archetype::Enemy(kind))
            }
        };
        scene.attach(node);
        scene.set_transform(node, position, 1.0);

        let stats = kind.stats();
        Enemy {
            node,
            kind,
            position,
            velocity: Vec3::ZERO,
            heading: heading.normalize_or(Vec3::Z),
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            hit_radius: stats.hit_radius,
            points: stats.points,
            phase_offset,
        }
    }

    /// Detach the enemy's node and return it to the kind's free list
    pub fn recycle(&mut self, enemy: &Enemy, scene: &mut dyn SceneGraph) {
        scene.detach(enemy.node);
        self.free.entry(enemy.kind).or_default().push(enemy.node);
    }

    pub fn free_count(&self, kind: EnemyKind) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    /// Nodes ever created through this factory
    pub fn created(&self) -> usize {
        self.created
    }
}

#[derive(Debug, Default)]
pub struct EnemyRoster {
    enemies: Vec<Enemy>,
}

impl EnemyRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
    }

    /// Remove index `i` by moving the last enemy into its place
    pub fn swap_remove(&mut self, i: usize) -> Option<Enemy> {
        (i < self.enemies.len()).then(|| self.enemies.swap_remove(i))
    }

    /// Advance every enemy along its kind's motion pattern
    pub fn advance(&mut self, dt_secs: f32, time_secs: f32, scene: &mut dyn SceneGraph) {
        for e in &mut self.enemies {
            e.velocity = e.kind.velocity(e.heading, time_secs, e.phase_offset);
            e.position += e.velocity * dt_secs;
            scene.set_transform(e.node, e.position, 1.0);
        }
    }

    /// Recycle every enemy
    pub fn clear(&mut self, factory: &mut ActorFactory, scene: &mut dyn SceneGraph) {
        for e in self.enemies.drain(..) {
            factory.recycle(&e, scene);
        }
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Enemy> {
        self.enemies.get(i)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Enemy> {
        self.enemies.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Enemy> {
        self.enemies.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Enemy> {
        self.enemies.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;

    #[test]
    fn test_factory_reuses_nodes_per_kind() {
        let mut scene = RecordingScene::new();
        let mut factory = ActorFactory::new();
        let a = factory.spawn(&mut scene, EnemyKind::Drone, Vec3::ZERO, Vec3::Z, 0.0);
        factory.recycle(&a, &mut scene);
        assert!(!scene.is_attached(a.node));

        // Different kind does not take the drone's node
        let b = factory.spawn(&mut scene, EnemyKind::Brute, Vec3::ZERO, Vec3::Z, 0.0);
        assert_ne!(a.node, b.node);
        let c = factory.spawn(&mut scene, EnemyKind::Drone, Vec3::ZERO, Vec3::Z, 0.0);
        assert_eq!(a.node, c.node);
        assert_eq!(factory.created(), 2);
        assert_eq!(scene.created(), 2);
        assert_eq!(c.hp, EnemyKind::Drone.stats().max_hp);
    }

    #[test]
    fn test_prewarm_fills_free_list() {
        let mut scene = RecordingScene::new();
        let mut factory = ActorFactory::new();
        factory.prewarm(EnemyKind::Swarmer, 4, &mut scene);
        assert_eq!(factory.free_count(EnemyKind::Swarmer), 4);
        for _ in 0..4 {
            factory.spawn(&mut scene, EnemyKind::Swarmer, Vec3::ZERO, Vec3::Z, 0.0);
        }
        assert_eq!(scene.created(), 4);
        assert_eq!(factory.free_count(EnemyKind::Swarmer), 0);
    }

    #[test]
    fn test_swap_remove_fills_gap_with_last() {
        let mut scene = RecordingScene::new();
        let mut factory = ActorFactory::new();
        let mut roster = EnemyRoster::new();
        for kind in [EnemyKind::Drone, EnemyKind::Swarmer, EnemyKind::Brute] {
            roster.push(factory.spawn(&mut scene, kind, Vec3::ZERO, Vec3::Z, 0.0));
        }
        let removed = roster.swap_remove(0).unwrap();
        assert_eq!(removed.kind, EnemyKind::Drone);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(0).unwrap().kind, EnemyKind::Brute);
        assert_eq!(roster.get(1).unwrap().kind, EnemyKind::Swarmer);
        assert!(roster.swap_remove(5).is_none());
    }

    #[test]
    fn test_clear_recycles_everything() {
        let mut scene = RecordingScene::new();
        let mut factory = ActorFactory::new();
        let mut roster = EnemyRoster::new();
        for _ in 0..3 {
            roster.push(factory.spawn(&mut scene, EnemyKind::Drone, Vec3::ZERO, Vec3::Z, 0.0));
        }
        roster.clear(&mut factory, &mut scene);
        assert!(roster.is_empty());
        assert_eq!(scene.attached_count(), 0);
        assert_eq!(factory.free_count(EnemyKind::Drone), 3);
    }
}
