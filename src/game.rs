//! Top-level game: the stage implementation driven by `FrameScheduler`
//!
//! - input: drain vision messages, run the signal pipeline, drive phase
//!   holds and menu picks from gesture edges
//! - particles: advance the particle ring
//! - simulation: step the combat session while playing
//! - render: refresh particle instances and publish throttled snapshots

use std::collections::BTreeMap;

use glam::Vec2;

use crate::combat::{CombatSession, MenuTarget, pick_menu_target};
use crate::config::GameConfig;
use crate::events::{EventBus, Subscription};
use crate::frame::{FrameContext, FrameStages};
use crate::input::{
    Gesture, Handedness, InputEvent, LandmarkInbox, LandmarkSender, ProcessedHandEvent,
    SignalProcessor, VisionMessage,
};
use crate::phase::{CalibrationSource, Phase, PhaseEvent, PhaseManager};
use crate::scene::SceneGraph;
use crate::snapshot::{PresentationSnapshot, SnapshotThrottle};

/// Menu target ids
pub mod menu {
    pub const RESUME: &str = "resume";
    pub const RESTART: &str = "restart";
    pub const RECALIBRATE: &str = "recalibrate";
    pub const HELP: &str = "help";
    pub const HELP_PREV: &str = "help_prev";
    pub const HELP_NEXT: &str = "help_next";
    pub const HELP_ENEMY: &str = "help_enemy";
    pub const HELP_BACK: &str = "help_back";
}

fn target(id: &str, x: f32, y: f32) -> MenuTarget {
    MenuTarget {
        id: id.to_string(),
        center: Vec2::new(x, y),
        radius: 0.07,
    }
}

/// Pointer targets per phase, in normalized screen space
pub fn default_menus() -> BTreeMap<Phase, Vec<MenuTarget>> {
    let mut menus = BTreeMap::new();
    menus.insert(
        Phase::Paused,
        vec![
            target(menu::RESUME, 0.5, 0.3),
            target(menu::RESTART, 0.5, 0.45),
            target(menu::RECALIBRATE, 0.5, 0.6),
            target(menu::HELP, 0.5, 0.75),
        ],
    );
    menus.insert(
        Phase::Help,
        vec![
            target(menu::HELP_PREV, 0.2, 0.85),
            target(menu::HELP_NEXT, 0.8, 0.85),
            target(menu::HELP_ENEMY, 0.5, 0.5),
            target(menu::HELP_BACK, 0.5, 0.85),
        ],
    );
    menus
}

pub struct Game<S: SceneGraph> {
    scene: S,
    inbox: LandmarkInbox,
    processor: SignalProcessor,
    input_events: Subscription<InputEvent>,
    phase: PhaseManager,
    phase_events: Subscription<PhaseEvent>,
    combat: CombatSession,
    menus: BTreeMap<Phase, Vec<MenuTarget>>,
    snapshots: EventBus<PresentationSnapshot>,
    throttle: SnapshotThrottle,
    edges: Vec<InputEvent>,
    prev_cursor: Vec2,
    /// Timestamp of the last primary-hand sample fed to the phase guards
    last_primary_sample_ms: Option<f64>,
}

impl<S: SceneGraph> Game<S> {
    /// Build a game around `scene`. The returned sender goes to the vision
    /// collaborator.
    pub fn new(config: GameConfig, mut scene: S) -> (Self, LandmarkSender) {
        let (sender, inbox) = LandmarkInbox::channel();
        let mut processor = SignalProcessor::new(config.input);
        let input_events = processor.subscribe();
        let mut phase = PhaseManager::new(config.phase.clone());
        let phase_events = phase.subscribe();
        let mut combat = CombatSession::new(
            config.combat,
            config.spawn.clone(),
            config.weapon,
            config.quality.max_particles(),
        );
        combat.prewarm(&mut scene);
        log::info!(
            "Game ready: {:?} lifecycle, {:?} calibration, {} particles",
            config.phase.variant,
            config.phase.calibration_source,
            config.quality.max_particles()
        );

        let game = Self {
            scene,
            inbox,
            processor,
            input_events,
            phase,
            phase_events,
            combat,
            menus: default_menus(),
            snapshots: EventBus::new(),
            throttle: SnapshotThrottle::new(config.snapshot_interval_ms),
            edges: Vec::with_capacity(8),
            prev_cursor: Vec2::splat(0.5),
            last_primary_sample_ms: None,
        };
        (game, sender)
    }

    pub fn phase(&self) -> &PhaseManager {
        &self.phase
    }

    /// Phase manager access for presentation collaborators (handlers, hooks)
    pub fn phase_mut(&mut self) -> &mut PhaseManager {
        &mut self.phase
    }

    pub fn processor(&self) -> &SignalProcessor {
        &self.processor
    }

    pub fn combat(&self) -> &CombatSession {
        &self.combat
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn subscribe_snapshots(&mut self) -> Subscription<PresentationSnapshot> {
        self.snapshots.subscribe()
    }

    /// Instance bytes written by the last render stage
    pub fn particle_bytes(&self) -> &[u8] {
        self.combat.particles().instance_bytes()
    }

    /// External calibration signal from the presentation layer. Only honored
    /// with `CalibrationSource::External`.
    pub fn complete_calibration(&mut self, now_ms: f64) -> bool {
        if !self.phase.complete_calibration(now_ms) {
            return false;
        }
        if !self.processor.calibrate() {
            log::debug!("Calibration completed with no primary hand tracked");
        }
        self.sync_phase();
        true
    }

    pub fn snapshot(&self, now_ms: f64) -> PresentationSnapshot {
        PresentationSnapshot {
            at_ms: now_ms,
            phase: self.phase.phase(),
            calibration_progress: self.phase.calibration_progress(),
            pause_progress: self.phase.pause_progress(),
            weapon: self.combat.weapon().snapshot(),
            help: self.phase.help(),
            showcase: self.phase.showcase(),
            left_tracked: self.processor.is_present(Handedness::Left),
            right_tracked: self.processor.is_present(Handedness::Right),
            cursor: self.processor.primary_cursor(),
            gesture: self.processor.primary_gesture(),
            stats: self.combat.stats(),
            finished: self.combat.finished(),
        }
    }

    /// Did the given hand start pinching this frame?
    fn pinch_began(&self, hand: Handedness) -> bool {
        self.edges.iter().any(|e| {
            matches!(e, InputEvent::GestureBegan { hand: h, gesture: Gesture::Pinch, .. } if *h == hand)
        })
    }

    /// React to transitions that happened since the last call
    fn sync_phase(&mut self) {
        for event in self.phase_events.drain() {
            if let PhaseEvent::Transitioned(t) = event {
                self.throttle.force();
                // A fresh run starts from a clean session
                if t.to == Phase::Ready {
                    self.combat.reset(&mut self.scene);
                }
            }
        }
    }

    fn drive_phase(&mut self, ctx: FrameContext) {
        let now = ctx.now_ms;
        let dt = ctx.sim_dt_ms();
        let primary = self.processor.primary_hand();
        let cursor = self.processor.primary_cursor();
        let stable = self.processor.primary_stable();

        match self.phase.phase() {
            Phase::Title => {
                if self.pinch_began(primary) {
                    self.phase.begin(now);
                }
            }
            Phase::Calibrating => {
                let held = self.phase.update_calibration_hold(stable, dt);
                if held && self.phase.config().calibration_source == CalibrationSource::HoldTimer {
                    self.processor.calibrate();
                    self.phase.transition_to(Phase::Ready, now);
                }
            }
            Phase::Ready => {
                if self.pinch_began(primary) {
                    self.phase.request_start(now);
                }
            }
            Phase::Playing => {
                let fist = self.processor.primary_gesture() == Gesture::Fist;
                if self.phase.update_pause_hold(fist, dt) {
                    self.phase.transition_to(Phase::Paused, now);
                } else {
                    if self.processor.primary_gesture() == Gesture::Pinch {
                        self.combat.fire_primary(cursor, &mut self.scene);
                    }
                    let off_hand = match primary {
                        Handedness::Left => Handedness::Right,
                        Handedness::Right => Handedness::Left,
                    };
                    if self.pinch_began(off_hand) {
                        self.combat.fire_munition(cursor, &mut self.scene);
                    }
                }
            }
            Phase::Paused | Phase::Help => {
                if self.pinch_began(primary) {
                    self.pick_menu(cursor, now);
                }
            }
            Phase::GameOver => {
                if self.pinch_began(primary) {
                    self.phase.transition_to(Phase::Ready, now);
                }
            }
        }
        self.prev_cursor = cursor;
    }

    /// Stability only counts per primary-hand sample, stamped with the
    /// sample time, never per frame.
    fn record_sample(&mut self, message: &VisionMessage, processed: Option<ProcessedHandEvent>) {
        let primary = self.processor.primary_hand();
        match (message, processed) {
            (_, Some(event)) if event.handedness == primary => {
                let since_prev = self
                    .last_primary_sample_ms
                    .map_or(0.0, |t| (event.timestamp_ms - t).max(0.0));
                self.phase
                    .record_stability(event.stable, event.timestamp_ms, since_prev);
                self.last_primary_sample_ms = Some(event.timestamp_ms);
            }
            (
                VisionMessage::Lost {
                    handedness,
                    timestamp_ms,
                },
                None,
            ) if *handedness == primary => {
                self.phase.record_stability(false, *timestamp_ms, 0.0);
                self.last_primary_sample_ms = None;
            }
            _ => {}
        }
    }

    fn pick_menu(&mut self, cursor: Vec2, now: f64) {
        let phase = self.phase.phase();
        let Some(targets) = self.menus.get(&phase) else {
            return;
        };
        let Some(picked) = pick_menu_target(targets, self.prev_cursor, cursor) else {
            return;
        };
        log::debug!("Picked menu target {:?} in {:?}", picked.id, phase);
        match picked.id.as_str() {
            menu::RESUME => {
                self.phase.transition_to(Phase::Playing, now);
            }
            menu::RESTART => {
                self.phase.transition_to(Phase::Ready, now);
            }
            menu::RECALIBRATE => {
                self.phase.transition_to(Phase::Calibrating, now);
            }
            menu::HELP => {
                self.phase.transition_to(Phase::Help, now);
            }
            menu::HELP_PREV => self.phase.help_prev_page(),
            menu::HELP_NEXT => self.phase.help_next_page(),
            menu::HELP_ENEMY => {
                self.phase.help_next_enemy();
            }
            menu::HELP_BACK => {
                self.phase.transition_to(Phase::Paused, now);
            }
            other => log::warn!("Unhandled menu target {other:?}"),
        }
    }
}

impl<S: SceneGraph> FrameStages for Game<S> {
    fn input(&mut self, ctx: FrameContext) {
        let messages: Vec<VisionMessage> = self.inbox.drain_latest().collect();
        for message in messages {
            let processed = self.processor.handle(&message);
            self.record_sample(&message, processed);
        }
        self.edges.clear();
        self.edges.extend(self.input_events.drain());
        self.drive_phase(ctx);
        self.sync_phase();
    }

    fn particles(&mut self, ctx: FrameContext) {
        self.combat.update_particles(&ctx);
    }

    fn simulation(&mut self, ctx: FrameContext) {
        if self.phase.phase() != Phase::Playing {
            return;
        }
        self.combat.step(&ctx, &mut self.scene);
        if self.combat.finished().is_some() {
            self.phase.end(ctx.now_ms);
            self.sync_phase();
        }
    }

    fn render(&mut self, ctx: FrameContext) {
        self.combat.particles_mut().write_instances();
        if self.throttle.ready(ctx.now_ms) {
            let snapshot = self.snapshot(ctx.now_ms);
            self.snapshots.publish(&snapshot);
        }
    }
}
