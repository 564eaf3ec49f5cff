//! Hand-tracking input pipeline
//!
//! The vision collaborator pushes `LandmarkFrame`s at its own cadence; the
//! input stage drains them once per admitted frame and runs them through
//! `SignalProcessor` to get a stable cursor plus pinch/fist/palm gestures.

pub mod cursor;
pub mod filter;
pub mod gesture;
pub mod landmarks;
pub mod processor;

pub use cursor::{StabilityConfig, StabilityTracker, VirtualPad};
pub use filter::{FilterConfig, OneEuroFilter, PointFilter};
pub use gesture::{Gesture, GestureConfig, classify_dual, classify_gesture};
pub use landmarks::{
    Handedness, LANDMARK_COUNT, LandmarkFrame, LandmarkInbox, LandmarkSender, Landmarks,
    VisionMessage,
};
pub use processor::{InputConfig, InputEvent, PrimaryHand, ProcessedHandEvent, SignalProcessor};
