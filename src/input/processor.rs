//! Per-frame landmark pipeline
//!
//! raw landmarks -> One Euro smoothing -> gesture + cursor -> stability.
//! State is kept per hand so left and right never share filter history.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::cursor::{StabilityConfig, StabilityTracker, VirtualPad};
use super::filter::{FilterConfig, PointFilter};
use super::gesture::{Gesture, GestureConfig, classify_dual};
use super::landmarks::{
    Handedness, INDEX_TIP, LANDMARK_COUNT, LandmarkFrame, Landmarks, VisionMessage,
};
use crate::events::{EventBus, Subscription};

/// Tuning for the whole input pipeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub filter: FilterConfig,
    pub gesture: GestureConfig,
    pub pad: VirtualPad,
    pub stability: StabilityConfig,
    /// Hand that drives the cursor
    pub primary_hand: PrimaryHand,
}

/// Serde-friendly default wrapper for the cursor hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryHand(pub Handedness);

impl Default for PrimaryHand {
    fn default() -> Self {
        Self(Handedness::Right)
    }
}

/// Derived per-frame result; recomputed every input frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessedHandEvent {
    pub timestamp_ms: f64,
    pub handedness: Handedness,
    pub smoothed: Landmarks,
    pub gesture: Gesture,
    /// Normalized cursor in [0,1]^2
    pub cursor: Vec2,
    pub stable: bool,
}

/// Discrete input edges published to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    GestureBegan {
        hand: Handedness,
        gesture: Gesture,
        timestamp_ms: f64,
    },
    GestureEnded {
        hand: Handedness,
        gesture: Gesture,
        timestamp_ms: f64,
    },
    HandFound {
        hand: Handedness,
        timestamp_ms: f64,
    },
    HandLost {
        hand: Handedness,
        timestamp_ms: f64,
    },
}

#[derive(Debug, Clone)]
struct HandState {
    filters: [PointFilter; LANDMARK_COUNT],
    smoothed: Landmarks,
    raw: Landmarks,
    present: bool,
    gesture: Gesture,
    cursor: Vec2,
    raw_cursor: Vec2,
    stable: bool,
    stability: StabilityTracker,
}

impl HandState {
    fn new(filter: FilterConfig) -> Self {
        Self {
            filters: [PointFilter::new(filter); LANDMARK_COUNT],
            smoothed: [Vec3::ZERO; LANDMARK_COUNT],
            raw: [Vec3::ZERO; LANDMARK_COUNT],
            present: false,
            gesture: Gesture::Palm,
            cursor: Vec2::splat(0.5),
            raw_cursor: Vec2::splat(0.5),
            stable: false,
            stability: StabilityTracker::default(),
        }
    }

    fn reset_history(&mut self) {
        for f in &mut self.filters {
            f.reset();
        }
        self.stability.reset();
        self.stable = false;
    }
}

/// Turns jittery landmark frames into stable cursors and gesture events
#[derive(Debug)]
pub struct SignalProcessor {
    config: InputConfig,
    hands: [HandState; 2],
    calibration_offset: Vec2,
    events: EventBus<InputEvent>,
}

impl SignalProcessor {
    pub fn new(config: InputConfig) -> Self {
        Self {
            hands: [HandState::new(config.filter), HandState::new(config.filter)],
            config,
            calibration_offset: Vec2::splat(0.5),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn subscribe(&mut self) -> Subscription<InputEvent> {
        self.events.subscribe()
    }

    /// Route one vision message
    pub fn handle(&mut self, message: &VisionMessage) -> Option<ProcessedHandEvent> {
        match message {
            VisionMessage::Hand(frame) => Some(self.process(frame)),
            VisionMessage::Lost {
                handedness,
                timestamp_ms,
            } => {
                self.mark_lost(*handedness, *timestamp_ms);
                None
            }
        }
    }

    /// Process one landmark frame.
    ///
    /// Partial or corrupt frames fail closed: gesture `Palm`, not stable,
    /// cursor held at its last value.
    pub fn process(&mut self, frame: &LandmarkFrame) -> ProcessedHandEvent {
        let hand = frame.handedness;
        let ts = frame.timestamp_ms;

        let Some(raw) = frame.landmarks() else {
            log::debug!("Partial landmark frame ({} points) for {:?}", frame.points.len(), hand);
            let state = &mut self.hands[hand.index()];
            state.stability.reset();
            state.stable = false;
            self.set_gesture(hand, Gesture::Palm, ts);
            let state = &self.hands[hand.index()];
            return ProcessedHandEvent {
                timestamp_ms: ts,
                handedness: hand,
                smoothed: state.smoothed,
                gesture: Gesture::Palm,
                cursor: state.cursor,
                stable: false,
            };
        };

        let pad = self.config.pad;
        let offset = self.calibration_offset;
        let state = &mut self.hands[hand.index()];
        let found = !state.present;
        state.present = true;

        for (i, p) in raw.iter().enumerate() {
            state.smoothed[i] = state.filters[i].filter(*p, ts);
        }
        state.raw = raw;
        state.cursor = pad.project(state.smoothed[INDEX_TIP], offset);
        state.raw_cursor = pad.project(raw[INDEX_TIP], offset);
        state.stable = state
            .stability
            .update(state.cursor, state.raw_cursor, &self.config.stability);

        let gesture = classify_dual(&state.smoothed, Some(&state.raw[..]), &self.config.gesture);
        let event = ProcessedHandEvent {
            timestamp_ms: ts,
            handedness: hand,
            smoothed: state.smoothed,
            gesture,
            cursor: state.cursor,
            stable: state.stable,
        };

        if found {
            self.events.publish(&InputEvent::HandFound {
                hand,
                timestamp_ms: ts,
            });
        }
        self.set_gesture(hand, gesture, ts);
        event
    }

    /// Vision reported no hand: drop presence and filter history
    pub fn mark_lost(&mut self, hand: Handedness, timestamp_ms: f64) {
        let state = &mut self.hands[hand.index()];
        let was_present = state.present;
        state.present = false;
        state.reset_history();
        self.set_gesture(hand, Gesture::Palm, timestamp_ms);
        if was_present {
            self.events.publish(&InputEvent::HandLost {
                hand,
                timestamp_ms,
            });
        }
    }

    fn set_gesture(&mut self, hand: Handedness, gesture: Gesture, timestamp_ms: f64) {
        let state = &mut self.hands[hand.index()];
        let previous = state.gesture;
        if previous == gesture {
            return;
        }
        state.gesture = gesture;
        if previous != Gesture::Palm {
            self.events.publish(&InputEvent::GestureEnded {
                hand,
                gesture: previous,
                timestamp_ms,
            });
        }
        if gesture != Gesture::Palm {
            self.events.publish(&InputEvent::GestureBegan {
                hand,
                gesture,
                timestamp_ms,
            });
        }
    }

    /// Anchor the primary hand's current raw fingertip as screen center.
    /// Returns false when that hand is not tracked.
    pub fn calibrate(&mut self) -> bool {
        let state = &self.hands[self.config.primary_hand.0.index()];
        if !state.present {
            return false;
        }
        self.calibration_offset = self.config.pad.normalize(state.raw[INDEX_TIP]);
        log::info!(
            "Calibrated cursor offset to ({:.3}, {:.3})",
            self.calibration_offset.x,
            self.calibration_offset.y
        );
        true
    }

    pub fn calibration_offset(&self) -> Vec2 {
        self.calibration_offset
    }

    pub fn is_present(&self, hand: Handedness) -> bool {
        self.hands[hand.index()].present
    }

    pub fn gesture(&self, hand: Handedness) -> Gesture {
        self.hands[hand.index()].gesture
    }

    pub fn primary_hand(&self) -> Handedness {
        self.config.primary_hand.0
    }

    pub fn primary_cursor(&self) -> Vec2 {
        self.hands[self.primary_hand().index()].cursor
    }

    pub fn primary_gesture(&self) -> Gesture {
        self.gesture(self.primary_hand())
    }

    pub fn primary_stable(&self) -> bool {
        let state = &self.hands[self.primary_hand().index()];
        state.present && state.stable
    }
}

#[cfg(test)]
mod tests {
    use super::super::gesture::fixtures::*;
    use super::*;

    fn frame(t: f64, pts: Landmarks) -> LandmarkFrame {
        LandmarkFrame::new(t, Handedness::Right, pts.to_vec())
    }

    fn identity_config() -> InputConfig {
        InputConfig {
            pad: VirtualPad {
                origin: Vec2::ZERO,
                width: 1.0,
                height: 1.0,
            },
            stability: StabilityConfig {
                smoothed_tolerance: 0.015,
                raw_tolerance: 0.015,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_still_hand_becomes_stable() {
        let mut sp = SignalProcessor::new(identity_config());
        let first = sp.process(&frame(0.0, open_palm()));
        assert!(!first.stable);
        let second = sp.process(&frame(16.0, shifted(open_palm(), 0.002, 0.001)));
        assert!(second.stable);
        assert_eq!(second.gesture, Gesture::Palm);
        assert!(sp.primary_stable());
    }

    #[test]
    fn test_large_jump_is_unstable() {
        let mut sp = SignalProcessor::new(identity_config());
        sp.process(&frame(0.0, open_palm()));
        sp.process(&frame(16.0, open_palm()));
        let jumped = sp.process(&frame(32.0, shifted(open_palm(), 0.05, 0.0)));
        assert!(!jumped.stable);
    }

    #[test]
    fn test_partial_frame_fails_closed() {
        let mut sp = SignalProcessor::new(identity_config());
        sp.process(&frame(0.0, pinch()));
        assert_eq!(sp.primary_gesture(), Gesture::Pinch);
        let partial = LandmarkFrame::new(16.0, Handedness::Right, pinch()[..8].to_vec());
        let out = sp.process(&partial);
        assert_eq!(out.gesture, Gesture::Palm);
        assert!(!out.stable);
        assert_eq!(sp.primary_gesture(), Gesture::Palm);
    }

    #[test]
    fn test_gesture_edges_are_published() {
        let mut sp = SignalProcessor::new(identity_config());
        let sub = sp.subscribe();
        sp.process(&frame(0.0, open_palm()));
        sp.process(&frame(16.0, pinch()));
        sp.process(&frame(32.0, pinch()));
        sp.process(&frame(48.0, fist()));

        let events: Vec<_> = sub.drain().collect();
        assert!(matches!(events[0], InputEvent::HandFound { .. }));
        assert!(matches!(
            events[1],
            InputEvent::GestureBegan { gesture: Gesture::Pinch, .. }
        ));
        assert!(matches!(
            events[2],
            InputEvent::GestureEnded { gesture: Gesture::Pinch, .. }
        ));
        assert!(matches!(
            events[3],
            InputEvent::GestureBegan { gesture: Gesture::Fist, .. }
        ));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_lost_hand_resets_presence() {
        let mut sp = SignalProcessor::new(identity_config());
        sp.process(&frame(0.0, fist()));
        assert!(sp.is_present(Handedness::Right));
        sp.handle(&VisionMessage::Lost {
            handedness: Handedness::Right,
            timestamp_ms: 16.0,
        });
        assert!(!sp.is_present(Handedness::Right));
        assert_eq!(sp.primary_gesture(), Gesture::Palm);
        assert!(!sp.primary_stable());
    }

    #[test]
    fn test_calibrate_centers_cursor() {
        let mut sp = SignalProcessor::new(InputConfig::default());
        assert!(!sp.calibrate());
        let rest = shifted(open_palm(), 0.1, -0.05);
        sp.process(&frame(0.0, rest));
        assert!(sp.calibrate());
        // Filters pass the first sample through, so re-feeding the same pose
        // lands on center
        let out = sp.process(&frame(16.0, rest));
        assert!((out.cursor - Vec2::splat(0.5)).length() < 1e-4);
    }
}
