//! Game configuration
//!
//! Every tunable lives in one serde tree with complete defaults, so `{}` is
//! a valid config file and a partial file only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::CombatConfig;
use crate::frame::LoopConfig;
use crate::input::InputConfig;
use crate::phase::PhaseConfig;
use crate::spawn::SpawnCurve;
use crate::weapon::WeaponConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Particle ring capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 256,
            QualityPreset::Medium => 1024,
            QualityPreset::High => 4096,
        }
    }
}

impl std::str::FromStr for QualityPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            other => Err(invalid("quality", format!("unknown preset {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub input: InputConfig,
    pub phase: PhaseConfig,
    pub spawn: SpawnCurve,
    pub weapon: WeaponConfig,
    pub combat: CombatConfig,
    pub quality: QualityPreset,
    /// Minimum gap between presentation snapshots
    pub snapshot_interval_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            loop_config: LoopConfig::default(),
            input: InputConfig::default(),
            phase: PhaseConfig::default(),
            spawn: SpawnCurve::default(),
            weapon: WeaponConfig::default(),
            combat: CombatConfig::default(),
            quality: QualityPreset::default(),
            snapshot_interval_ms: 100.0,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the runtime can't make sense of
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lp = &self.loop_config;
        if !(lp.target_fps.is_finite() && lp.target_fps > 0.0) {
            return Err(invalid("loop.target_fps", "must be positive"));
        }
        if lp.max_time_scale < 1.0 {
            return Err(invalid("loop.max_time_scale", "must be at least 1"));
        }

        let f = &self.input.filter;
        if f.min_cutoff <= 0.0 || f.d_cutoff <= 0.0 || f.beta < 0.0 {
            return Err(invalid(
                "input.filter",
                "cutoffs must be positive and beta non-negative",
            ));
        }
        let g = &self.input.gesture;
        if g.pinch_threshold <= 0.0 || g.fist_threshold <= 0.0 {
            return Err(invalid("input.gesture", "thresholds must be positive"));
        }
        let pad = &self.input.pad;
        if pad.width <= 0.0 || pad.height <= 0.0 {
            return Err(invalid("input.pad", "width and height must be positive"));
        }

        let ph = &self.phase;
        if ph.pause_hold_ms < 0.0 || ph.calibration_hold_ms < 0.0 {
            return Err(invalid("phase", "hold durations can't be negative"));
        }
        if ph.help_pages == 0 {
            return Err(invalid("phase.help_pages", "must be at least 1"));
        }

        if self.spawn.tiers.is_empty() {
            return Err(invalid("spawn.tiers", "at least one tier is required"));
        }
        for (i, tier) in self.spawn.tiers.iter().enumerate() {
            if tier.interval_ms <= 0.0 {
                return Err(invalid("spawn.tiers", format!("tier {i} interval must be positive")));
            }
            if tier.weights.iter().all(|(_, w)| *w == 0) {
                return Err(invalid("spawn.tiers", format!("tier {i} has no positive weight")));
            }
        }
        if self
            .spawn
            .tiers
            .windows(2)
            .any(|w| w[1].start_ms < w[0].start_ms)
        {
            return Err(invalid("spawn.tiers", "tiers must be sorted by start_ms"));
        }

        let w = &self.weapon;
        if w.max_heat <= 0.0 || w.heat_per_shot < 0.0 {
            return Err(invalid("weapon", "max_heat must be positive"));
        }

        let c = &self.combat;
        if c.max_play_time_ms <= 0.0 {
            return Err(invalid("combat.max_play_time_ms", "must be positive"));
        }
        if c.breach_limit == 0 {
            return Err(invalid("combat.breach_limit", "must be at least 1"));
        }

        if self.snapshot_interval_ms < 0.0 {
            return Err(invalid("snapshot_interval_ms", "can't be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{CalibrationSource, PhaseVariant};

    #[test]
    fn test_empty_json_is_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "loop": { "target_fps": 30.0 },
            "phase": { "variant": "Guarded", "calibration_source": "External" },
            "quality": "High"
        }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.loop_config.target_fps, 30.0);
        assert_eq!(config.loop_config.max_time_scale, 4.0);
        assert_eq!(config.phase.variant, PhaseVariant::Guarded);
        assert_eq!(config.phase.calibration_source, CalibrationSource::External);
        assert_eq!(config.phase.pause_hold_ms, PhaseConfig::default().pause_hold_ms);
        assert_eq!(config.quality.max_particles(), 4096);
    }

    #[test]
    fn test_round_trip_default() {
        let json = GameConfig::default().to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), GameConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameConfig::from_json(r#"{ "loop": { "target_fps": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "loop.target_fps", .. }));

        let err = GameConfig::from_json(r#"{ "phase": { "help_pages": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "phase.help_pages", .. }));

        let err = GameConfig::from_json(r#"{ "spawn": { "tiers": [] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "spawn.tiers", .. }));

        let unsorted = r#"{ "spawn": { "tiers": [
            { "start_ms": 100.0, "interval_ms": 10.0, "weights": [["Drone", 1]] },
            { "start_ms": 0.0, "interval_ms": 10.0, "weights": [["Drone", 1]] }
        ] } }"#;
        let err = GameConfig::from_json(unsorted).unwrap_err();
        assert!(err.to_string().contains("sorted"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("med".parse::<QualityPreset>().unwrap(), QualityPreset::Medium);
        assert_eq!("HIGH".parse::<QualityPreset>().unwrap(), QualityPreset::High);
        assert!("ultra".parse::<QualityPreset>().is_err());
    }
}
