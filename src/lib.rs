//! Gesture Strike - hand-tracked combat simulation kernel
//!
//! Core modules:
//! - `frame`: Frame admission and staged per-frame callbacks
//! - `phase`: Session lifecycle state machine
//! - `input`: Landmark smoothing, gesture classification, cursor projection
//! - `spawn` / `rng`: Deterministic, seed-reproducible spawn curve
//! - `weapon`: Heat, cooldown and recoil model
//! - `pool`: Pooled projectiles, munitions, particles and enemy actors
//! - `collision`: Swept-segment hit tests
//! - `combat` / `game`: Wiring everything into one playable session
//!
//! The kernel never draws. Rendering goes through the `scene::SceneGraph`
//! collaborator and UI reads `snapshot::PresentationSnapshot`s.

pub mod collision;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod events;
pub mod frame;
pub mod game;
pub mod input;
pub mod phase;
pub mod pool;
pub mod rng;
pub mod scene;
pub mod snapshot;
pub mod spawn;
pub mod weapon;

pub use combat::{CombatEvent, CombatSession, RunEnd};
pub use config::{ConfigError, GameConfig, QualityPreset};
pub use frame::{FrameContext, FrameScheduler, FrameStages};
pub use game::Game;
pub use phase::{Phase, PhaseManager};
pub use rng::SeededRng;
