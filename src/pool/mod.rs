//! Pooled entity systems
//!
//! High-churn visual entities reuse slots instead of allocating:
//! - `spawn` scans for an inactive slot and reinitializes it before growing
//! - expiry flips `active = false`; slots never move, so handles stay stable
//! - handles carry a generation so a stale handle can't touch a reused slot
//!
//! Enemies are the exception: `EnemyRoster` uses swap-and-pop removal.

pub mod actors;
pub mod munition;
pub mod particles;
pub mod projectile;

pub use actors::{ActorFactory, Enemy, EnemyRoster};
pub use munition::{Detonation, Munition, MunitionPool};
pub use particles::{Burst, ParticleInstance, ParticleRingBuffer, ParticleSlot};
pub use projectile::{Projectile, ProjectilePool};

use crate::scene::{Archetype, NodeId, SceneGraph};

/// Generation-checked index into a `Pool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    active: bool,
    node: NodeId,
    data: T,
}

/// Reusable slot array backed by scene nodes
#[derive(Debug, Clone)]
pub struct Pool<T> {
    archetype: Archetype,
    slots: Vec<Slot<T>>,
    active: usize,
}

impl<T> Pool<T> {
    pub fn new(archetype: Archetype) -> Self {
        Self {
            archetype,
            slots: Vec::new(),
            active: 0,
        }
    }

    /// Pre-create `count` detached nodes so the first spawns don't allocate
    pub fn prewarm(&mut self, count: usize, scene: &mut dyn SceneGraph, init: impl Fn() -> T) {
        self.slots.reserve(count);
        for _ in 0..count {
            let node = scene.create(self.archetype);
            self.slots.push(Slot {
                generation: 0,
                active: false,
                node,
                data: init(),
            });
        }
    }

    /// Reuse the first inactive slot, or grow by one.
    pub fn spawn(&mut self, scene: &mut dyn SceneGraph, data: T) -> Handle {
        self.active += 1;
        if let Some(index) = self.slots.iter().position(|s| !s.active) {
            let slot = &mut self.slots[index];
            slot.active = true;
            slot.data = data;
            scene.attach(slot.node);
            return Handle {
                index: index as u32,
                generation: slot.generation,
            };
        }

        let node = scene.create(self.archetype);
        scene.attach(node);
        self.slots.push(Slot {
            generation: 0,
            active: true,
            node,
            data,
        });
        log::debug!("{:?} pool grew to {}", self.archetype, self.slots.len());
        Handle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn live_slot(&self, handle: Handle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.active && s.generation == handle.generation)
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.live_slot(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.live_slot(handle).map(|s| &s.data)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.data)
    }

    pub fn node(&self, handle: Handle) -> Option<NodeId> {
        self.live_slot(handle).map(|s| s.node)
    }

    fn deactivate(slot: &mut Slot<T>, scene: &mut dyn SceneGraph) {
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        scene.detach(slot.node);
    }

    /// Return a slot to the pool. Stale or unknown handles are ignored.
    pub fn release(&mut self, handle: Handle, scene: &mut dyn SceneGraph) -> bool {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.active && slot.generation == handle.generation => {
                Self::deactivate(slot, scene);
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self, scene: &mut dyn SceneGraph) {
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            Self::deactivate(slot, scene);
        }
        self.active = 0;
    }

    /// Visit every active slot; slots for which `keep` returns false are
    /// deactivated in place.
    pub fn update_active(
        &mut self,
        scene: &mut dyn SceneGraph,
        mut keep: impl FnMut(Handle, NodeId, &mut T, &mut dyn SceneGraph) -> bool,
    ) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            let handle = Handle {
                index: i as u32,
                generation: slot.generation,
            };
            if !keep(handle, slot.node, &mut slot.data, scene) {
                Self::deactivate(slot, scene);
                self.active -= 1;
            }
        }
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                Handle {
                    index: i as u32,
                    generation: s.generation,
                },
                &s.data,
            )
        })
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Total slots, active or not
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
