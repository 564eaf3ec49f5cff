//! Weapon cooldown / heat model
//!
//! Primary fire is rate limited and builds heat; reaching max heat locks the
//! weapon for a fixed time. The munition launcher has its own cooldown and
//! exposes a 0..1 charge for the HUD. `update` must run every frame because
//! heat decay and overheat release are time driven.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub primary_cooldown_ms: f64,
    pub heat_per_shot: f32,
    pub max_heat: f32,
    /// Linear decay while not overheated (heat units per second)
    pub heat_decay_per_sec: f32,
    pub overheat_lockout_ms: f64,
    pub munition_cooldown_ms: f64,
    pub recoil_per_shot: f32,
    pub recoil_recovery_per_sec: f32,
    pub max_recoil: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            primary_cooldown_ms: 120.0,
            heat_per_shot: 12.5,
            max_heat: 100.0,
            heat_decay_per_sec: 35.0,
            overheat_lockout_ms: 2000.0,
            munition_cooldown_ms: 4000.0,
            recoil_per_shot: 0.08,
            recoil_recovery_per_sec: 0.6,
            max_recoil: 0.3,
        }
    }
}

/// Read-only weapon snapshot for presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    pub heat: f32,
    pub is_overheated: bool,
    pub overheat_unlock_at_ms: f64,
    pub next_primary_fire_at_ms: f64,
    /// `None` until the first munition is fired
    pub last_munition_fired_at_ms: Option<f64>,
    /// 0 right after firing, 1 when the launcher is ready
    pub munition_charge: f32,
    pub recoil_offset: f32,
}

impl Default for WeaponState {
    fn default() -> Self {
        Self {
            heat: 0.0,
            is_overheated: false,
            overheat_unlock_at_ms: 0.0,
            next_primary_fire_at_ms: 0.0,
            last_munition_fired_at_ms: None,
            munition_charge: 1.0,
            recoil_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeaponController {
    config: WeaponConfig,
    state: WeaponState,
}

impl WeaponController {
    pub fn new(config: WeaponConfig) -> Self {
        Self {
            config,
            state: WeaponState::default(),
        }
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> WeaponState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = WeaponState::default();
    }

    fn release_overheat(&mut self, now_ms: f64) {
        if self.state.is_overheated && now_ms >= self.state.overheat_unlock_at_ms {
            self.state.is_overheated = false;
            self.state.heat = 0.0;
            log::debug!("Weapon cooled down at {:.0}ms", now_ms);
        }
    }

    /// Try to fire the primary weapon. Rejected while overheated or cooling.
    pub fn try_fire_primary(&mut self, now_ms: f64) -> bool {
        self.release_overheat(now_ms);
        if self.state.is_overheated || now_ms < self.state.next_primary_fire_at_ms {
            return false;
        }

        self.state.next_primary_fire_at_ms = now_ms + self.config.primary_cooldown_ms;
        self.state.heat = (self.state.heat + self.config.heat_per_shot).min(self.config.max_heat);
        self.state.recoil_offset =
            (self.state.recoil_offset + self.config.recoil_per_shot).min(self.config.max_recoil);

        if self.state.heat >= self.config.max_heat {
            self.state.is_overheated = true;
            self.state.overheat_unlock_at_ms = now_ms + self.config.overheat_lockout_ms;
            log::debug!(
                "Weapon overheated at {:.0}ms, locked until {:.0}ms",
                now_ms,
                self.state.overheat_unlock_at_ms
            );
        }
        true
    }

    pub fn can_fire_munition(&self, now_ms: f64) -> bool {
        match self.state.last_munition_fired_at_ms {
            Some(last) => now_ms - last >= self.config.munition_cooldown_ms,
            None => true,
        }
    }

    /// Try to launch an area munition; independent of heat
    pub fn try_fire_munition(&mut self, now_ms: f64) -> bool {
        if !self.can_fire_munition(now_ms) {
            return false;
        }
        self.state.last_munition_fired_at_ms = Some(now_ms);
        self.state.munition_charge = 0.0;
        true
    }

    /// Advance time-driven state. Call once per frame.
    pub fn update(&mut self, delta_ms: f64, now_ms: f64) {
        let dt = (delta_ms / 1000.0) as f32;
        self.release_overheat(now_ms);

        if !self.state.is_overheated && self.state.heat > 0.0 {
            self.state.heat = (self.state.heat - self.config.heat_decay_per_sec * dt).max(0.0);
        }

        if self.state.recoil_offset > 0.0 {
            self.state.recoil_offset =
                (self.state.recoil_offset - self.config.recoil_recovery_per_sec * dt).max(0.0);
        }

        self.state.munition_charge = match self.state.last_munition_fired_at_ms {
            Some(last) if self.config.munition_cooldown_ms > 0.0 => {
                ((now_ms - last) / self.config.munition_cooldown_ms).clamp(0.0, 1.0) as f32
            }
            _ => 1.0,
        };
    }
}
