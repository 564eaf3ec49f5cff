//! Particle ring buffer
//!
//! Fixed capacity, preallocated. New particles are written at `head`; when
//! full the oldest particle (at `tail`) is overwritten. Expiry only ever pops
//! from the tail, so a particle that dies early stays in the buffer (drawn at
//! zero size) until everything older than it has expired too.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::rng::SeededRng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSlot {
    pub position: Vec3,
    pub velocity: Vec3,
    /// 1 at birth, falls to 0
    pub age: f32,
    /// Age lost per second
    pub decay: f32,
    pub color: [f32; 4],
}

impl ParticleSlot {
    const DEAD: Self = Self {
        position: Vec3::ZERO,
        velocity: Vec3::ZERO,
        age: 0.0,
        decay: 0.0,
        color: [0.0; 4],
    };
}

/// GPU-ready instance record (32 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

/// Burst parameters for `ParticleRingBuffer::burst`
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub origin: Vec3,
    pub count: usize,
    pub speed: f32,
    /// Lifetime range in seconds
    pub lifetime_secs: (f32, f32),
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct ParticleRingBuffer {
    slots: Vec<ParticleSlot>,
    head: usize,
    tail: usize,
    count: usize,
    drag: f32,
    base_size: f32,
    instances: Vec<ParticleInstance>,
}

impl ParticleRingBuffer {
    pub fn new(max_particles: usize) -> Self {
        Self {
            slots: vec![ParticleSlot::DEAD; max_particles],
            head: 0,
            tail: 0,
            count: 0,
            drag: 0.9,
            base_size: 0.08,
            instances: Vec::with_capacity(max_particles),
        }
    }

    /// Per-second velocity retention (0.9 keeps 90% after one second)
    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag.clamp(0.0, 1.0);
        self
    }

    pub fn max_particles(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
        self.instances.clear();
    }

    /// Write one particle at the head, evicting the oldest when full.
    pub fn emit(&mut self, particle: ParticleSlot) {
        let max = self.slots.len();
        if max == 0 {
            return;
        }
        self.slots[self.head] = particle;
        self.head = (self.head + 1) % max;
        if self.count == max {
            self.tail = (self.tail + 1) % max;
        } else {
            self.count += 1;
        }
    }

    /// Spray `count` particles in random directions from `origin`
    pub fn burst(&mut self, rng: &mut SeededRng, burst: Burst) {
        let (min_life, max_life) = burst.lifetime_secs;
        for _ in 0..burst.count {
            let dir = Vec3::new(
                rng.range_f32(-1.0, 1.0),
                rng.range_f32(-1.0, 1.0),
                rng.range_f32(-1.0, 1.0),
            )
            .normalize_or(Vec3::Y);
            let speed = rng.range_f32(burst.speed * 0.4, burst.speed);
            let life = rng.range_f32(min_life, max_life).max(0.01);
            self.emit(ParticleSlot {
                position: burst.origin,
                velocity: dir * speed,
                age: 1.0,
                decay: 1.0 / life,
                color: burst.color,
            });
        }
    }

    /// Age and move every live particle, then pop expired ones off the tail.
    pub fn update(&mut self, dt_secs: f32) {
        let max = self.slots.len();
        if self.count == 0 || dt_secs <= 0.0 {
            return;
        }
        let retain = self.drag.powf(dt_secs);
        for i in 0..self.count {
            let slot = &mut self.slots[(self.tail + i) % max];
            slot.age = (slot.age - slot.decay * dt_secs).max(0.0);
            slot.position += slot.velocity * dt_secs;
            slot.velocity *= retain;
        }
        while self.count > 0 && self.slots[self.tail].age <= 0.0 {
            self.tail = (self.tail + 1) % max;
            self.count -= 1;
        }
    }

    /// Live particles, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ParticleSlot> {
        let max = self.slots.len().max(1);
        (0..self.count).map(move |i| &self.slots[(self.tail + i) % max])
    }

    /// Rebuild the instance buffer from live particles. Reuses its allocation.
    pub fn write_instances(&mut self) -> &[ParticleInstance] {
        self.instances.clear();
        let max = self.slots.len();
        for i in 0..self.count {
            let p = &self.slots[(self.tail + i) % max];
            self.instances.push(ParticleInstance {
                position: p.position.to_array(),
                size: self.base_size * p.age,
                color: p.color,
            });
        }
        &self.instances
    }

    /// Raw bytes of the last `write_instances` result
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
