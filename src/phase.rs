//! Session phase state machine
//!
//! Exactly one phase is active. `transition_to` is the only mutator; illegal
//! requests return `false`, change nothing, and publish a
//! `PhaseEvent::Rejected` carrying a human-readable reason.
//!
//! On a successful transition, side effects run in a fixed order:
//! 1. record the transition timestamp
//! 2. reset phase-local hold timers
//! 3. help sub-state / showcase bookkeeping
//! 4. visibility toggles from the declarative `VisibilityMap`
//! 5. the per-phase enter handler
//! 6. the post-transition hook
//! 7. subscriber notification

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enemy::EnemyKind;
use crate::events::{EventBus, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a start pinch (only used by the guarded lifecycle)
    Title,
    /// Anchoring the resting hand as the cursor origin
    Calibrating,
    /// Calibrated, waiting for the start gesture
    Ready,
    /// Run in progress
    Playing,
    /// Run frozen behind the pause menu
    Paused,
    /// Run over, stats on screen
    GameOver,
    /// Help pages opened from the pause menu
    Help,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Title,
        Phase::Calibrating,
        Phase::Ready,
        Phase::Playing,
        Phase::Paused,
        Phase::GameOver,
        Phase::Help,
    ];
}

/// Which lifecycle rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhaseVariant {
    /// Plain adjacency list, starts in `Calibrating`
    #[default]
    Classic,
    /// Starts in `Title`; starting play is guarded by input stability
    Guarded,
}

/// Single authoritative source for calibration completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalibrationSource {
    /// Accumulated in-loop stability time completes calibration
    #[default]
    HoldTimer,
    /// Only `complete_calibration()` (presentation collaborator) completes it
    External,
}

/// Named presentation groups toggled on phase entry
pub mod groups {
    pub const TITLE_SCREEN: &str = "title_screen";
    pub const CALIBRATION_OVERLAY: &str = "calibration_overlay";
    pub const READY_MENU: &str = "ready_menu";
    pub const HUD: &str = "hud";
    pub const PAUSE_MENU: &str = "pause_menu";
    pub const GAMEOVER_PANEL: &str = "gameover_panel";
    pub const HELP_PANEL: &str = "help_panel";
}

/// Groups to show and hide when a phase is entered
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub show: Vec<String>,
    pub hide: Vec<String>,
}

impl VisibilityRule {
    fn new(show: &[&str], hide: &[&str]) -> Self {
        Self {
            show: show.iter().map(|s| s.to_string()).collect(),
            hide: hide.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Declarative phase -> visibility policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityMap(pub BTreeMap<Phase, VisibilityRule>);

impl Default for VisibilityMap {
    fn default() -> Self {
        use groups::*;
        let mut map = BTreeMap::new();
        map.insert(
            Phase::Title,
            VisibilityRule::new(
                &[TITLE_SCREEN],
                &[CALIBRATION_OVERLAY, READY_MENU, HUD, PAUSE_MENU, GAMEOVER_PANEL, HELP_PANEL],
            ),
        );
        map.insert(
            Phase::Calibrating,
            VisibilityRule::new(
                &[CALIBRATION_OVERLAY],
                &[TITLE_SCREEN, READY_MENU, HUD, PAUSE_MENU, GAMEOVER_PANEL, HELP_PANEL],
            ),
        );
        map.insert(
            Phase::Ready,
            VisibilityRule::new(
                &[READY_MENU, HUD],
                &[TITLE_SCREEN, CALIBRATION_OVERLAY, PAUSE_MENU, GAMEOVER_PANEL, HELP_PANEL],
            ),
        );
        map.insert(
            Phase::Playing,
            VisibilityRule::new(
                &[HUD],
                &[READY_MENU, PAUSE_MENU, GAMEOVER_PANEL, HELP_PANEL, CALIBRATION_OVERLAY],
            ),
        );
        map.insert(
            Phase::Paused,
            VisibilityRule::new(&[PAUSE_MENU, HUD], &[HELP_PANEL, READY_MENU]),
        );
        map.insert(Phase::Help, VisibilityRule::new(&[HELP_PANEL], &[PAUSE_MENU]));
        map.insert(
            Phase::GameOver,
            VisibilityRule::new(&[GAMEOVER_PANEL], &[HUD, PAUSE_MENU]),
        );
        Self(map)
    }
}

/// Current on/off state of each named group
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupVisibility(BTreeMap<String, bool>);

impl GroupVisibility {
    fn apply(&mut self, rule: &VisibilityRule) {
        for g in &rule.show {
            self.0.insert(g.clone(), true);
        }
        for g in &rule.hide {
            self.0.insert(g.clone(), false);
        }
    }

    /// Unknown groups report hidden
    pub fn is_visible(&self, group: &str) -> bool {
        self.0.get(group).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub variant: PhaseVariant,
    pub calibration_source: CalibrationSource,
    /// Continuous fist time that pauses play
    pub pause_hold_ms: f64,
    /// Continuous stable time that completes calibration
    pub calibration_hold_ms: f64,
    /// A stable sample must be this recent to start play (guarded)
    pub stability_window_ms: f64,
    /// Stable time needed in `Ready` before a start gesture counts (guarded)
    pub start_stability_ms: f64,
    pub help_pages: u32,
    pub visibility: VisibilityMap,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            variant: PhaseVariant::Classic,
            calibration_source: CalibrationSource::HoldTimer,
            pause_hold_ms: 800.0,
            calibration_hold_ms: 1500.0,
            stability_window_ms: 250.0,
            start_stability_ms: 500.0,
            help_pages: 3,
            visibility: VisibilityMap::default(),
        }
    }
}

/// What the caller asked for when a guard said no
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseAction {
    Transition(Phase),
    End,
    CompleteCalibration,
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub at_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseEvent {
    Transitioned(PhaseTransition),
    Rejected {
        action: PhaseAction,
        from: Phase,
        reason: String,
    },
}

/// Sub-state of the help screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelpState {
    pub page: u32,
    pub enemy_index: u32,
}

pub type PhaseHandler = Box<dyn FnMut(&PhaseTransition)>;

/// Is `from -> to` in the adjacency list for this variant?
pub fn is_legal(variant: PhaseVariant, from: Phase, to: Phase) -> bool {
    use Phase::*;
    match (from, to) {
        (Title, Calibrating) => variant == PhaseVariant::Guarded,
        (Calibrating, Ready)
        | (Ready, Playing)
        | (Playing, Paused)
        | (Playing, GameOver)
        | (Paused, Playing)
        | (Paused, Ready)
        | (Paused, Calibrating)
        | (Paused, Help)
        | (Help, Paused)
        | (GameOver, Ready) => true,
        _ => false,
    }
}

pub struct PhaseManager {
    config: PhaseConfig,
    phase: Phase,
    entered_at_ms: f64,
    visibility: GroupVisibility,
    enter_handlers: BTreeMap<Phase, PhaseHandler>,
    post_hook: Option<PhaseHandler>,
    events: EventBus<PhaseEvent>,
    pause_hold_ms: f64,
    calibration_hold_ms: f64,
    ready_stable_ms: f64,
    last_stable_at_ms: Option<f64>,
    help: HelpState,
    showcase: Option<EnemyKind>,
}

impl PhaseManager {
    pub fn new(config: PhaseConfig) -> Self {
        let phase = match config.variant {
            PhaseVariant::Classic => Phase::Calibrating,
            PhaseVariant::Guarded => Phase::Title,
        };
        let mut visibility = GroupVisibility::default();
        if let Some(rule) = config.visibility.0.get(&phase) {
            visibility.apply(rule);
        }
        Self {
            config,
            phase,
            entered_at_ms: 0.0,
            visibility,
            enter_handlers: BTreeMap::new(),
            post_hook: None,
            events: EventBus::new(),
            pause_hold_ms: 0.0,
            calibration_hold_ms: 0.0,
            ready_stable_ms: 0.0,
            last_stable_at_ms: None,
            help: HelpState::default(),
            showcase: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    pub fn entered_at_ms(&self) -> f64 {
        self.entered_at_ms
    }

    pub fn visibility(&self) -> &GroupVisibility {
        &self.visibility
    }

    pub fn help(&self) -> HelpState {
        self.help
    }

    pub fn showcase(&self) -> Option<EnemyKind> {
        self.showcase
    }

    pub fn subscribe(&mut self) -> Subscription<PhaseEvent> {
        self.events.subscribe()
    }

    pub fn events_mut(&mut self) -> &mut EventBus<PhaseEvent> {
        &mut self.events
    }

    /// Handler run after visibility is applied when `phase` is entered
    pub fn on_enter(&mut self, phase: Phase, handler: PhaseHandler) {
        self.enter_handlers.insert(phase, handler);
    }

    pub fn set_post_transition_hook(&mut self, hook: PhaseHandler) {
        self.post_hook = Some(hook);
    }

    fn reject(&mut self, action: PhaseAction, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        log::debug!("Phase guard rejected {:?} from {:?}: {}", action, self.phase, reason);
        self.events.publish(&PhaseEvent::Rejected {
            action,
            from: self.phase,
            reason,
        });
        false
    }

    /// Request a transition. Returns false (with no side effects besides the
    /// rejection event) when it is illegal or a guard fails.
    pub fn transition_to(&mut self, next: Phase, now_ms: f64) -> bool {
        let from = self.phase;
        let action = PhaseAction::Transition(next);
        if !is_legal(self.config.variant, from, next) {
            return self.reject(action, format!("illegal transition {:?} -> {:?}", from, next));
        }

        if self.config.variant == PhaseVariant::Guarded && from == Phase::Ready && next == Phase::Playing
        {
            let recent = self
                .last_stable_at_ms
                .is_some_and(|t| now_ms - t <= self.config.stability_window_ms);
            if !recent {
                return self.reject(action, "stability gap exceeded");
            }
            if self.ready_stable_ms < self.config.start_stability_ms {
                return self.reject(action, "calibration stability below threshold");
            }
        }

        self.apply(from, next, now_ms);
        true
    }

    fn apply(&mut self, from: Phase, to: Phase, now_ms: f64) {
        self.phase = to;
        self.entered_at_ms = now_ms;

        self.pause_hold_ms = 0.0;
        self.calibration_hold_ms = 0.0;
        self.ready_stable_ms = 0.0;

        if to == Phase::Help {
            self.help = HelpState::default();
            self.showcase = None;
        }
        if from == Phase::Help {
            self.showcase = None;
        }

        if let Some(rule) = self.config.visibility.0.get(&to) {
            self.visibility.apply(rule);
        }

        let transition = PhaseTransition {
            from,
            to,
            at_ms: now_ms,
        };
        if let Some(handler) = self.enter_handlers.get_mut(&to) {
            handler(&transition);
        }
        if let Some(hook) = self.post_hook.as_mut() {
            hook(&transition);
        }
        log::info!("Phase {:?} -> {:?} at {:.0}ms", from, to, now_ms);
        self.events.publish(&PhaseEvent::Transitioned(transition));
    }

    /// End the run. Only legal while playing.
    pub fn end(&mut self, now_ms: f64) -> bool {
        if self.phase != Phase::Playing {
            return self.reject(PhaseAction::End, "cannot end when not playing");
        }
        self.transition_to(Phase::GameOver, now_ms)
    }

    /// Start play from `Ready` in response to a start gesture
    pub fn request_start(&mut self, now_ms: f64) -> bool {
        if self.phase != Phase::Ready {
            return self.reject(PhaseAction::Start, "can only start from ready");
        }
        self.transition_to(Phase::Playing, now_ms)
    }

    /// Leave the title screen (guarded lifecycle only)
    pub fn begin(&mut self, now_ms: f64) -> bool {
        self.transition_to(Phase::Calibrating, now_ms)
    }

    /// External calibration completion signal
    pub fn complete_calibration(&mut self, now_ms: f64) -> bool {
        if self.config.calibration_source != CalibrationSource::External {
            return self.reject(
                PhaseAction::CompleteCalibration,
                "calibration is driven by the hold timer",
            );
        }
        if self.phase != Phase::Calibrating {
            return self.reject(PhaseAction::CompleteCalibration, "not calibrating");
        }
        self.transition_to(Phase::Ready, now_ms)
    }

    /// Feed one input sample's stability, stamped with the sample time and
    /// the gap since the previous sample of the same hand. Tracks the last
    /// stable timestamp and the continuous stable time spent in `Ready`; a
    /// gap wider than the stability window breaks continuity.
    pub fn record_stability(&mut self, stable: bool, sample_ms: f64, since_prev_ms: f64) {
        if stable {
            self.last_stable_at_ms = Some(sample_ms);
        }
        let continuous = since_prev_ms <= self.config.stability_window_ms;
        if self.phase == Phase::Ready && stable && continuous {
            self.ready_stable_ms += since_prev_ms;
        } else {
            self.ready_stable_ms = 0.0;
        }
    }

    /// Level-triggered pause hold. Returns true exactly once per completed
    /// hold; the gesture must be released before it can fire again.
    pub fn update_pause_hold(&mut self, gesture_active: bool, delta_ms: f64) -> bool {
        if self.phase != Phase::Playing || !gesture_active {
            self.pause_hold_ms = 0.0;
            return false;
        }
        if self.pause_hold_ms < 0.0 {
            // Fired already; wait for release
            return false;
        }
        self.pause_hold_ms += delta_ms;
        if self.pause_hold_ms >= self.config.pause_hold_ms {
            self.pause_hold_ms = -1.0;
            return true;
        }
        false
    }

    /// Level-triggered calibration hold, same contract as the pause hold
    pub fn update_calibration_hold(&mut self, stable: bool, delta_ms: f64) -> bool {
        if self.phase != Phase::Calibrating || !stable {
            self.calibration_hold_ms = 0.0;
            return false;
        }
        if self.calibration_hold_ms < 0.0 {
            return false;
        }
        self.calibration_hold_ms += delta_ms;
        if self.calibration_hold_ms >= self.config.calibration_hold_ms {
            self.calibration_hold_ms = -1.0;
            return true;
        }
        false
    }

    /// Progress of the current hold in [0,1]
    pub fn pause_progress(&self) -> f32 {
        hold_progress(self.pause_hold_ms, self.config.pause_hold_ms)
    }

    /// Calibration progress in [0,1]; 1 once past calibration
    pub fn calibration_progress(&self) -> f32 {
        match self.phase {
            Phase::Title => 0.0,
            Phase::Calibrating => {
                hold_progress(self.calibration_hold_ms, self.config.calibration_hold_ms)
            }
            _ => 1.0,
        }
    }

    pub fn help_next_page(&mut self) {
        if self.phase == Phase::Help {
            self.help.page = (self.help.page + 1) % self.config.help_pages.max(1);
        }
    }

    pub fn help_prev_page(&mut self) {
        if self.phase == Phase::Help {
            let last = self.config.help_pages.max(1) - 1;
            self.help.page = match self.help.page.checked_sub(1) {
                Some(page) => page.min(last),
                None => last,
            };
        }
    }

    /// Cycle the enemy showcased on the help screen
    pub fn help_next_enemy(&mut self) -> Option<EnemyKind> {
        if self.phase != Phase::Help {
            return None;
        }
        let kinds = EnemyKind::ALL;
        let kind = kinds[self.help.enemy_index as usize % kinds.len()];
        self.help.enemy_index = (self.help.enemy_index + 1) % kinds.len() as u32;
        self.showcase = Some(kind);
        self.showcase
    }

    #[cfg(test)]
    fn force_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }
}

/// Completed holds park at -1 until released; report them as full
fn hold_progress(accum: f64, target: f64) -> f32 {
    if accum < 0.0 {
        return 1.0;
    }
    if target <= 0.0 {
        return 1.0;
    }
    (accum / target).clamp(0.0, 1.0) as f32
}
