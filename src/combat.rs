//! Combat session
//!
//! Owns everything that lives for one run: the spawn curve, the weapon, the
//! entity pools and the enemy roster. The session keeps its own clock
//! (`elapsed_ms`) that only advances while `step` is called, so pausing
//! freezes spawns, fuses and cooldowns together.
//!
//! World layout: the player sits at the origin looking down -Z. Enemies
//! spawn far down -Z and fly toward the origin; crossing `breach_z` costs
//! lives.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::{segment_hits_circle, segment_hits_sphere, spheres_overlap};
use crate::enemy::EnemyKind;
use crate::frame::FrameContext;
use crate::pool::{
    ActorFactory, Burst, Detonation, EnemyRoster, Handle, MunitionPool, ParticleRingBuffer,
    ProjectilePool,
};
use crate::rng::SeededRng;
use crate::scene::SceneGraph;
use crate::spawn::{SpawnCurve, SpawnEvent, SpawnScheduler};
use crate::weapon::{WeaponConfig, WeaponController};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub max_play_time_ms: f64,
    /// Lives lost to breaches before the run ends
    pub breach_limit: u32,
    /// Enemies at or beyond this z have reached the player
    pub breach_z: f32,
    pub spawn_distance: f32,
    /// Half extents of the spawn window around the -Z axis
    pub spawn_half_width: f32,
    pub spawn_half_height: f32,
    /// Horizontal / vertical aim spread at the cursor edges (tan of angle)
    pub aim_spread: Vec2,
    /// Projectiles past this distance from the origin are dropped
    pub arena_radius: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime_ms: f64,
    pub projectile_damage: f32,
    pub munition_speed: f32,
    pub munition_lift: f32,
    pub munition_gravity: f32,
    pub munition_fuse_ms: f64,
    pub munition_blast_radius: f32,
    pub munition_damage: f32,
    /// y of the ground plane munitions detonate on
    pub ground_y: f32,
    pub kill_burst: usize,
    pub prewarm_projectiles: usize,
    pub prewarm_munitions: usize,
    pub prewarm_enemies: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_play_time_ms: 180_000.0,
            breach_limit: 5,
            breach_z: -1.0,
            spawn_distance: 60.0,
            spawn_half_width: 12.0,
            spawn_half_height: 5.0,
            aim_spread: Vec2::new(0.6, 0.4),
            arena_radius: 120.0,
            projectile_speed: 80.0,
            projectile_lifetime_ms: 1500.0,
            projectile_damage: 10.0,
            munition_speed: 22.0,
            munition_lift: 6.0,
            munition_gravity: 9.8,
            munition_fuse_ms: 2500.0,
            munition_blast_radius: 5.0,
            munition_damage: 60.0,
            ground_y: -6.0,
            kill_burst: 24,
            prewarm_projectiles: 64,
            prewarm_munitions: 8,
            prewarm_enemies: 6,
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEnd {
    /// Survived until the play time limit
    TimeUp,
    /// Too many enemies got past the breach line
    Overrun,
}

/// Things that happened during one `step` (or fire call)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Enemy entered the arena (spawn time on the curve)
    Spawned { kind: EnemyKind, at_ms: f64 },
    /// Primary shot left the muzzle
    PrimaryFired,
    /// Grenade thrown
    MunitionFired,
    /// Heat hit the ceiling; primary fire locked until it cools
    Overheated,
    /// Damage landed without killing, `hp` is what's left
    EnemyHit { kind: EnemyKind, hp: f32 },
    /// Munition blew up at `position`
    Detonated { position: Vec3 },
    /// Enemy destroyed, `points` added to the score
    EnemyKilled { kind: EnemyKind, points: u32 },
    /// Enemy crossed the breach line
    Breached { kind: EnemyKind, lives_left: u32 },
    /// Run ended, emitted once
    Finished(RunEnd),
}

/// Circular pick target for the pointer (menus, help buttons)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuTarget {
    pub id: String,
    /// Normalized screen position
    pub center: Vec2,
    pub radius: f32,
}

/// First target swept by the cursor moving from `prev` to `cursor`
pub fn pick_menu_target(targets: &[MenuTarget], prev: Vec2, cursor: Vec2) -> Option<&MenuTarget> {
    targets
        .iter()
        .find(|t| segment_hits_circle(prev, cursor, t.center, t.radius))
}

/// Read-only run stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Run clock (frozen while paused)
    pub elapsed_ms: f64,
    /// Sum of kill points
    pub score: u64,
    /// Enemies destroyed
    pub kills: u32,
    /// Breaches left before the run is overrun
    pub lives_left: u32,
    /// Primary shots fired
    pub shots_fired: u32,
    /// Enemies currently on the roster
    pub enemies_alive: u32,
}

pub struct CombatSession {
    config: CombatConfig,
    spawner: SpawnScheduler,
    weapon: WeaponController,
    projectiles: ProjectilePool,
    munitions: MunitionPool,
    particles: ParticleRingBuffer,
    factory: ActorFactory,
    roster: EnemyRoster,
    rng: SeededRng,
    elapsed_ms: f64,
    score: u64,
    kills: u32,
    lives_lost: u32,
    shots_fired: u32,
    finished: Option<RunEnd>,
    spawn_buf: Vec<SpawnEvent>,
    detonations: Vec<Detonation>,
    triggered: Vec<Handle>,
    fragments: Vec<(EnemyKind, Vec3, Vec3)>,
    events: Vec<CombatEvent>,
}

impl CombatSession {
    pub fn new(
        config: CombatConfig,
        curve: SpawnCurve,
        weapon: WeaponConfig,
        max_particles: usize,
    ) -> Self {
        // Separate stream so lane picks don't shift the spawn-kind sequence
        let rng = SeededRng::new(curve.seed.rotate_left(17) ^ 0xC0FF_EE00);
        Self {
            projectiles: ProjectilePool::new(0.15),
            munitions: MunitionPool::new(config.munition_gravity, config.ground_y, 0.4),
            particles: ParticleRingBuffer::new(max_particles),
            spawner: SpawnScheduler::new(curve),
            weapon: WeaponController::new(weapon),
            factory: ActorFactory::new(),
            roster: EnemyRoster::new(),
            rng,
            config,
            elapsed_ms: 0.0,
            score: 0,
            kills: 0,
            lives_lost: 0,
            shots_fired: 0,
            finished: None,
            spawn_buf: Vec::with_capacity(8),
            detonations: Vec::with_capacity(8),
            triggered: Vec::with_capacity(8),
            fragments: Vec::with_capacity(8),
            events: Vec::with_capacity(32),
        }
    }

    /// Create pooled nodes up front so the first frames of play don't allocate
    pub fn prewarm(&mut self, scene: &mut dyn SceneGraph) {
        self.projectiles.prewarm(self.config.prewarm_projectiles, scene);
        self.munitions.prewarm(self.config.prewarm_munitions, scene);
        for kind in EnemyKind::ALL {
            self.factory.prewarm(kind, self.config.prewarm_enemies, scene);
        }
    }

    /// Return every entity to its pool and rewind the run
    pub fn reset(&mut self, scene: &mut dyn SceneGraph) {
        self.projectiles.release_all(scene);
        self.munitions.release_all(scene);
        self.roster.clear(&mut self.factory, scene);
        self.particles.clear();
        self.spawner.reset();
        self.weapon.reset();
        self.rng = SeededRng::new(self.rng.seed());
        self.elapsed_ms = 0.0;
        self.score = 0;
        self.kills = 0;
        self.lives_lost = 0;
        self.shots_fired = 0;
        self.finished = None;
        self.events.clear();
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn weapon(&self) -> &WeaponController {
        &self.weapon
    }

    pub fn projectiles(&self) -> &ProjectilePool {
        &self.projectiles
    }

    pub fn munitions(&self) -> &MunitionPool {
        &self.munitions
    }

    pub fn particles(&self) -> &ParticleRingBuffer {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleRingBuffer {
        &mut self.particles
    }

    pub fn roster(&self) -> &EnemyRoster {
        &self.roster
    }

    pub fn factory(&self) -> &ActorFactory {
        &self.factory
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn finished(&self) -> Option<RunEnd> {
        self.finished
    }

    /// Events from the last `step` plus any fire calls since
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            elapsed_ms: self.elapsed_ms,
            score: self.score,
            kills: self.kills,
            lives_left: self.config.breach_limit.saturating_sub(self.lives_lost),
            shots_fired: self.shots_fired,
            enemies_alive: self.roster.len() as u32,
        }
    }

    /// World-space aim direction for a normalized cursor (y grows downward)
    pub fn aim_direction(&self, cursor: Vec2) -> Vec3 {
        let recoil = self.weapon.snapshot().recoil_offset;
        let x = (cursor.x - 0.5) * 2.0 * self.config.aim_spread.x;
        let y = (0.5 - cursor.y) * 2.0 * self.config.aim_spread.y + recoil;
        Vec3::new(x, y, -1.0).normalize()
    }

    pub fn fire_primary(&mut self, cursor: Vec2, scene: &mut dyn SceneGraph) -> bool {
        if self.finished.is_some() {
            return false;
        }
        let was_overheated = self.weapon.snapshot().is_overheated;
        // Aim before the shot adds recoil
        let dir = self.aim_direction(cursor);
        if !self.weapon.try_fire_primary(self.elapsed_ms) {
            return false;
        }
        self.projectiles.spawn(
            scene,
            Vec3::ZERO,
            dir * self.config.projectile_speed,
            self.elapsed_ms,
            self.config.projectile_lifetime_ms,
            self.config.projectile_damage,
        );
        self.shots_fired += 1;
        self.events.push(CombatEvent::PrimaryFired);
        if !was_overheated && self.weapon.snapshot().is_overheated {
            self.events.push(CombatEvent::Overheated);
        }
        true
    }

    pub fn fire_munition(&mut self, cursor: Vec2, scene: &mut dyn SceneGraph) -> bool {
        if self.finished.is_some() || !self.weapon.try_fire_munition(self.elapsed_ms) {
            return false;
        }
        let dir = self.aim_direction(cursor);
        let velocity = dir * self.config.munition_speed + Vec3::Y * self.config.munition_lift;
        self.munitions.spawn(
            scene,
            Vec3::ZERO,
            velocity,
            self.elapsed_ms,
            self.config.munition_fuse_ms,
            self.config.munition_blast_radius,
            self.config.munition_damage,
        );
        self.events.push(CombatEvent::MunitionFired);
        true
    }

    /// Advance particles only. Runs in the particle stage, also while paused.
    pub fn update_particles(&mut self, ctx: &FrameContext) {
        self.particles.update(ctx.sim_dt_secs());
    }

    /// One simulation step. Returns this step's events.
    pub fn step(&mut self, ctx: &FrameContext, scene: &mut dyn SceneGraph) -> &[CombatEvent] {
        self.events.clear();
        if self.finished.is_some() {
            return &self.events;
        }

        let dt_ms = ctx.sim_dt_ms();
        let dt = ctx.sim_dt_secs();
        self.elapsed_ms += dt_ms;
        // Pools and weapon run on the session clock
        let sim = FrameContext {
            now_ms: self.elapsed_ms,
            ..*ctx
        };

        self.spawn_due(dt_ms, scene);
        self.weapon.update(dt_ms, self.elapsed_ms);
        self.roster
            .advance(dt, (self.elapsed_ms / 1000.0) as f32, scene);

        self.advance_projectiles(&sim, scene);
        self.advance_munitions(&sim, scene);
        self.apply_detonations();
        self.resolve_kills(scene);
        self.resolve_breaches(scene);

        if self.finished.is_none() && self.elapsed_ms >= self.config.max_play_time_ms {
            self.finish(RunEnd::TimeUp);
        }
        &self.events
    }

    fn finish(&mut self, end: RunEnd) {
        self.finished = Some(end);
        self.events.push(CombatEvent::Finished(end));
        log::info!(
            "Run ended ({:?}) at {:.1}s: score {}, kills {}",
            end,
            self.elapsed_ms / 1000.0,
            self.score,
            self.kills
        );
    }

    fn spawn_due(&mut self, dt_ms: f64, scene: &mut dyn SceneGraph) {
        self.spawn_buf.clear();
        self.spawner.step(dt_ms, &mut self.spawn_buf);
        for i in 0..self.spawn_buf.len() {
            let event = self.spawn_buf[i];
            let position = Vec3::new(
                self.rng
                    .range_f32(-self.config.spawn_half_width, self.config.spawn_half_width),
                self.rng
                    .range_f32(-self.config.spawn_half_height, self.config.spawn_half_height),
                -self.config.spawn_distance,
            );
            let phase_offset = self.rng.range_f32(0.0, std::f32::consts::TAU);
            let heading = -position;
            let enemy = self
                .factory
                .spawn(scene, event.kind, position, heading, phase_offset);
            self.roster.push(enemy);
            self.events.push(CombatEvent::Spawned {
                kind: event.kind,
                at_ms: event.timestamp_ms,
            });
        }
    }

    fn advance_projectiles(&mut self, sim: &FrameContext, scene: &mut dyn SceneGraph) {
        let roster = &mut self.roster;
        let events = &mut self.events;
        let arena_sq = self.config.arena_radius * self.config.arena_radius;
        self.projectiles.update(sim, scene, |p| {
            // Sweep this tick's segment; newest enemies first
            for i in (0..roster.len()).rev() {
                let Some(e) = roster.get_mut(i) else { continue };
                if e.is_dead() {
                    continue;
                }
                if segment_hits_sphere(p.prev_position, p.position, e.position, e.hit_radius) {
                    e.hp -= p.damage;
                    events.push(CombatEvent::EnemyHit {
                        kind: e.kind,
                        hp: e.hp.max(0.0),
                    });
                    return true;
                }
            }
            p.position.length_squared() > arena_sq
        });
    }

    fn advance_munitions(&mut self, sim: &FrameContext, scene: &mut dyn SceneGraph) {
        // Contact with an enemy sets the munition off this step
        self.triggered.clear();
        for (handle, m) in self.munitions.iter() {
            let touching = self.roster.iter().any(|e| {
                !e.is_dead()
                    && segment_hits_sphere(m.prev_position, m.position, e.position, e.hit_radius)
            });
            if touching {
                self.triggered.push(handle);
            }
        }
        for &handle in &self.triggered {
            self.munitions.trigger(handle);
        }

        self.detonations.clear();
        self.munitions.update(sim, scene, &mut self.detonations);
    }

    fn apply_detonations(&mut self) {
        for d in &self.detonations {
            self.events.push(CombatEvent::Detonated {
                position: d.position,
            });
            for e in self.roster.iter_mut() {
                if !e.is_dead() && spheres_overlap(d.position, d.radius, e.position, e.hit_radius) {
                    e.hp -= d.damage;
                }
            }
            self.particles.burst(
                &mut self.rng,
                Burst {
                    origin: d.position,
                    count: self.config.kill_burst * 2,
                    speed: 10.0,
                    lifetime_secs: (0.4, 1.0),
                    color: [1.0, 0.6, 0.1, 1.0],
                },
            );
        }
    }

    fn resolve_kills(&mut self, scene: &mut dyn SceneGraph) {
        self.fragments.clear();
        // Backwards so swap_remove only moves already-visited enemies
        for i in (0..self.roster.len()).rev() {
            if !self.roster.get(i).is_some_and(|e| e.is_dead()) {
                continue;
            }
            let Some(enemy) = self.roster.swap_remove(i) else {
                continue;
            };
            self.factory.recycle(&enemy, scene);
            self.score += u64::from(enemy.points);
            self.kills += 1;
            self.events.push(CombatEvent::EnemyKilled {
                kind: enemy.kind,
                points: enemy.points,
            });
            self.particles.burst(
                &mut self.rng,
                Burst {
                    origin: enemy.position,
                    count: self.config.kill_burst,
                    speed: 6.0,
                    lifetime_secs: (0.3, 0.8),
                    color: kill_color(enemy.kind),
                },
            );
            for (n, &kind) in enemy.kind.fragments().iter().enumerate() {
                let side = if n % 2 == 0 { -1.0 } else { 1.0 };
                self.fragments
                    .push((kind, enemy.position + Vec3::X * side * enemy.hit_radius, enemy.heading));
            }
        }

        for i in 0..self.fragments.len() {
            let (kind, position, heading) = self.fragments[i];
            let phase_offset = self.rng.range_f32(0.0, std::f32::consts::TAU);
            let enemy = self.factory.spawn(scene, kind, position, heading, phase_offset);
            self.roster.push(enemy);
            self.events.push(CombatEvent::Spawned {
                kind,
                at_ms: self.elapsed_ms,
            });
        }
    }

    fn resolve_breaches(&mut self, scene: &mut dyn SceneGraph) {
        for i in (0..self.roster.len()).rev() {
            if !self
                .roster
                .get(i)
                .is_some_and(|e| e.position.z >= self.config.breach_z)
            {
                continue;
            }
            let Some(enemy) = self.roster.swap_remove(i) else {
                continue;
            };
            self.factory.recycle(&enemy, scene);
            self.lives_lost += enemy.kind.stats().breach_damage;
            let lives_left = self.config.breach_limit.saturating_sub(self.lives_lost);
            self.events.push(CombatEvent::Breached {
                kind: enemy.kind,
                lives_left,
            });
            log::debug!("{} breached, {} lives left", enemy.kind.name(), lives_left);
        }
        if self.finished.is_none() && self.lives_lost >= self.config.breach_limit {
            self.finish(RunEnd::Overrun);
        }
    }
}

fn kill_color(kind: EnemyKind) -> [f32; 4] {
    match kind {
        EnemyKind::Drone => [0.3, 0.8, 1.0, 1.0],
        EnemyKind::Swarmer => [1.0, 0.9, 0.2, 1.0],
        EnemyKind::Brute => [1.0, 0.3, 0.2, 1.0],
        EnemyKind::Splitter => [0.8, 0.3, 1.0, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Enemy;
    use crate::scene::RecordingScene;
    use crate::spawn::SpawnTier;

    fn ctx(interval_ms: f64) -> FrameContext {
        FrameContext {
            delta_ms: interval_ms,
            time_scale: 1.0,
            now_ms: 0.0,
            interval_ms,
        }
    }

    /// Curve that never spawns on its own during short tests
    fn quiet_curve() -> SpawnCurve {
        SpawnCurve {
            seed: 1,
            tiers: vec![SpawnTier {
                start_ms: 0.0,
                interval_ms: 1.0e9,
                weights: vec![(EnemyKind::Drone, 1)],
            }],
        }
    }

    fn session(config: CombatConfig) -> CombatSession {
        CombatSession::new(config, quiet_curve(), WeaponConfig::default(), 256)
    }

    fn place(s: &mut CombatSession, scene: &mut RecordingScene, kind: EnemyKind, position: Vec3) {
        let mut enemy: Enemy = s.factory.spawn(scene, kind, position, Vec3::Z, 0.0);
        // No forward motion; only the kind's wobble remains
        enemy.heading = Vec3::ZERO;
        s.roster.push(enemy);
    }

    #[test]
    fn test_projectile_kills_enemy_through_ccd() {
        let mut scene = RecordingScene::new();
        let mut s = session(CombatConfig {
            projectile_damage: 200.0,
            ..Default::default()
        });
        // One 100ms step moves a shot 8 units, so the brute at z=-20 is only
        // ever inside a swept segment, never at a sampled point
        place(&mut s, &mut scene, EnemyKind::Brute, Vec3::new(0.0, 0.0, -20.0));
        assert!(s.fire_primary(Vec2::splat(0.5), &mut scene));
        let mut killed = false;
        for _ in 0..5 {
            let events = s.step(&ctx(100.0), &mut scene).to_vec();
            killed |= events
                .iter()
                .any(|e| matches!(e, CombatEvent::EnemyKilled { kind: EnemyKind::Brute, .. }));
        }
        assert!(killed);
        assert_eq!(s.stats().kills, 1);
        assert_eq!(s.stats().score, u64::from(EnemyKind::Brute.stats().points));
        assert!(s.roster().is_empty());
        assert_eq!(s.projectiles().active_count(), 0);
        assert!(!s.particles().is_empty());
    }

    #[test]
    fn test_splitter_leaves_two_swarmers() {
        let mut scene = RecordingScene::new();
        let mut s = session(CombatConfig {
            projectile_damage: 1000.0,
            ..Default::default()
        });
        place(&mut s, &mut scene, EnemyKind::Splitter, Vec3::new(0.0, 0.0, -10.0));
        s.fire_primary(Vec2::splat(0.5), &mut scene);
        for _ in 0..3 {
            s.step(&ctx(100.0), &mut scene);
        }
        assert_eq!(s.stats().kills, 1);
        let kinds: Vec<_> = s.roster().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EnemyKind::Swarmer, EnemyKind::Swarmer]);
    }

    #[test]
    fn test_munition_blast_damages_area() {
        let mut scene = RecordingScene::new();
        let mut s = session(CombatConfig {
            munition_gravity: 0.0,
            munition_lift: 0.0,
            munition_fuse_ms: 300.0,
            ..Default::default()
        });
        // Both off the flight path; only the blast can reach them
        place(&mut s, &mut scene, EnemyKind::Drone, Vec3::new(2.0, 0.0, -6.6));
        place(&mut s, &mut scene, EnemyKind::Drone, Vec3::new(-2.0, 0.0, -6.6));
        assert!(s.fire_munition(Vec2::splat(0.5), &mut scene));
        assert!(!s.fire_munition(Vec2::splat(0.5), &mut scene));
        let mut detonated = false;
        for _ in 0..4 {
            let events = s.step(&ctx(100.0), &mut scene).to_vec();
            detonated |= events.iter().any(|e| matches!(e, CombatEvent::Detonated { .. }));
        }
        assert!(detonated);
        assert_eq!(s.stats().kills, 2);
        assert_eq!(s.munitions().active_count(), 0);
    }

    #[test]
    fn test_breach_ends_run() {
        let mut scene = RecordingScene::new();
        let mut s = session(CombatConfig {
            breach_limit: 2,
            ..Default::default()
        });
        place(&mut s, &mut scene, EnemyKind::Drone, Vec3::new(0.0, 0.0, 0.0));
        place(&mut s, &mut scene, EnemyKind::Drone, Vec3::new(1.0, 0.0, 0.0));
        let events = s.step(&ctx(16.0), &mut scene).to_vec();
        assert!(events.contains(&CombatEvent::Finished(RunEnd::Overrun)));
        assert_eq!(s.finished(), Some(RunEnd::Overrun));
        assert_eq!(s.stats().lives_left, 0);
        assert!(s.roster().is_empty());
        assert_eq!(scene.attached_count(), 0);
        assert!(!s.fire_primary(Vec2::splat(0.5), &mut scene));
    }

    #[test]
    fn test_time_limit() {
        let mut scene = RecordingScene::new();
        let mut s = session(CombatConfig {
            max_play_time_ms: 250.0,
            ..Default::default()
        });
        s.step(&ctx(100.0), &mut scene);
        s.step(&ctx(100.0), &mut scene);
        assert_eq!(s.finished(), None);
        s.step(&ctx(100.0), &mut scene);
        assert_eq!(s.finished(), Some(RunEnd::TimeUp));
        // Clock stops once finished
        s.step(&ctx(100.0), &mut scene);
        assert_eq!(s.elapsed_ms(), 300.0);
    }

    #[test]
    fn test_spawns_follow_curve_and_reuse_nodes() {
        let mut scene = RecordingScene::new();
        let mut s = CombatSession::new(
            CombatConfig::default(),
            SpawnCurve::default(),
            WeaponConfig::default(),
            64,
        );
        s.prewarm(&mut scene);
        let created = scene.created();
        for _ in 0..60 {
            s.step(&ctx(100.0), &mut scene);
        }
        // 6s at one drone per 2s
        assert_eq!(s.roster().len(), 3);
        assert_eq!(scene.created(), created);

        s.reset(&mut scene);
        assert!(s.roster().is_empty());
        assert_eq!(s.elapsed_ms(), 0.0);
        assert_eq!(s.factory().free_count(EnemyKind::Drone), CombatConfig::default().prewarm_enemies);
    }

    #[test]
    fn test_aim_center_is_straight_ahead() {
        let s = session(CombatConfig::default());
        let dir = s.aim_direction(Vec2::splat(0.5));
        assert!((dir - Vec3::NEG_Z).length() < 1e-6);
        let up = s.aim_direction(Vec2::new(0.5, 0.0));
        assert!(up.y > 0.0);
    }

    #[test]
    fn test_menu_target_swept_by_cursor() {
        let targets = vec![
            MenuTarget {
                id: "resume".into(),
                center: Vec2::new(0.3, 0.5),
                radius: 0.05,
            },
            MenuTarget {
                id: "help".into(),
                center: Vec2::new(0.7, 0.5),
                radius: 0.05,
            },
        ];
        // Fast swipe crosses "help" without either endpoint inside it
        let hit = pick_menu_target(&targets, Vec2::new(0.6, 0.5), Vec2::new(0.8, 0.5));
        assert_eq!(hit.map(|t| t.id.as_str()), Some("help"));
        assert!(pick_menu_target(&targets, Vec2::new(0.5, 0.1), Vec2::new(0.5, 0.2)).is_none());
    }
}
