//! Scene-graph collaborator contract
//!
//! The kernel never draws. It asks the host scene to create, attach, detach
//! and move opaque nodes that represent pooled entities.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::enemy::EnemyKind;

/// Opaque node handle issued by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// What kind of visual a node should be built as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Projectile,
    Munition,
    Enemy(EnemyKind),
}

pub trait SceneGraph {
    /// Build a new (detached) node. Pools call this only when they grow.
    fn create(&mut self, archetype: Archetype) -> NodeId;
    fn attach(&mut self, node: NodeId);
    fn detach(&mut self, node: NodeId);
    fn set_transform(&mut self, node: NodeId, position: Vec3, scale: f32);
}

/// In-memory scene that records what the kernel asked for.
///
/// Used by the headless binary and by tests to count create/attach calls.
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_id: u64,
    created: usize,
    attaches: usize,
    detaches: usize,
    archetypes: HashMap<NodeId, Archetype>,
    attached: HashSet<NodeId>,
    transforms: HashMap<NodeId, (Vec3, f32)>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn attaches(&self) -> usize {
        self.attaches
    }

    pub fn detaches(&self) -> usize {
        self.detaches
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attached.contains(&node)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn archetype(&self, node: NodeId) -> Option<Archetype> {
        self.archetypes.get(&node).copied()
    }

    pub fn transform(&self, node: NodeId) -> Option<(Vec3, f32)> {
        self.transforms.get(&node).copied()
    }
}

impl SceneGraph for RecordingScene {
    fn create(&mut self, archetype: Archetype) -> NodeId {
        self.next_id += 1;
        self.created += 1;
        let id = NodeId(self.next_id);
        self.archetypes.insert(id, archetype);
        id
    }

    fn attach(&mut self, node: NodeId) {
        self.attaches += 1;
        self.attached.insert(node);
    }

    fn detach(&mut self, node: NodeId) {
        self.detaches += 1;
        self.attached.remove(&node);
    }

    fn set_transform(&mut self, node: NodeId, position: Vec3, scale: f32) {
        self.transforms.insert(node, (position, scale));
    }
}
