//! One Euro filter
//!
//! Adaptive low-pass: the cutoff rises with the estimated speed of the signal,
//! so slow hands get heavy smoothing (less jitter) and fast hands get light
//! smoothing (less lag).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Filter tuning shared by every tracked axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Cutoff (Hz) when the signal is still
    pub min_cutoff: f32,
    /// How fast the cutoff grows with speed
    pub beta: f32,
    /// Cutoff (Hz) for the derivative estimate
    pub d_cutoff: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.007,
            d_cutoff: 1.0,
        }
    }
}

#[inline]
fn smoothing_factor(cutoff: f32, dt_secs: f32) -> f32 {
    let tau = 1.0 / (std::f32::consts::TAU * cutoff);
    1.0 / (1.0 + tau / dt_secs)
}

/// Single-axis filter state
#[derive(Debug, Clone, Copy, Default)]
pub struct OneEuroFilter {
    config: FilterConfig,
    prev_value: Option<f32>,
    prev_derivative: f32,
    prev_timestamp_ms: f64,
}

impl OneEuroFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            prev_value: None,
            prev_derivative: 0.0,
            prev_timestamp_ms: 0.0,
        }
    }

    /// Filter one sample. The first sample passes through unchanged.
    pub fn filter(&mut self, value: f32, timestamp_ms: f64) -> f32 {
        let Some(prev) = self.prev_value else {
            self.prev_value = Some(value);
            self.prev_timestamp_ms = timestamp_ms;
            return value;
        };

        let dt = ((timestamp_ms - self.prev_timestamp_ms) / 1000.0) as f32;
        if dt <= 0.0 {
            // Duplicate or out-of-order timestamp: hold the last output
            return prev;
        }

        let derivative = (value - prev) / dt;
        let a_d = smoothing_factor(self.config.d_cutoff, dt);
        let derivative = self.prev_derivative + a_d * (derivative - self.prev_derivative);

        let cutoff = self.config.min_cutoff + self.config.beta * derivative.abs();
        let a = smoothing_factor(cutoff, dt);
        let filtered = prev + a * (value - prev);

        self.prev_value = Some(filtered);
        self.prev_derivative = derivative;
        self.prev_timestamp_ms = timestamp_ms;
        filtered
    }

    /// Forget history; the next sample passes through
    pub fn reset(&mut self) {
        self.prev_value = None;
        self.prev_derivative = 0.0;
    }

    pub fn last(&self) -> Option<f32> {
        self.prev_value
    }
}

/// Three independent axis filters for one landmark
#[derive(Debug, Clone, Copy, Default)]
pub struct PointFilter {
    x: OneEuroFilter,
    y: OneEuroFilter,
    z: OneEuroFilter,
}

impl PointFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            x: OneEuroFilter::new(config),
            y: OneEuroFilter::new(config),
            z: OneEuroFilter::new(config),
        }
    }

    pub fn filter(&mut self, p: Vec3, timestamp_ms: f64) -> Vec3 {
        Vec3::new(
            self.x.filter(p.x, timestamp_ms),
            self.y.filter(p.y, timestamp_ms),
            self.z.filter(p.z, timestamp_ms),
        )
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = OneEuroFilter::new(FilterConfig::default());
        assert_eq!(f.filter(0.42, 0.0), 0.42);
    }

    #[test]
    fn test_constant_input_converges() {
        let mut f = OneEuroFilter::new(FilterConfig::default());
        f.filter(0.0, 0.0);
        let mut out = 0.0;
        for i in 1..=300 {
            out = f.filter(1.0, i as f64 * 16.67);
        }
        assert!((out - 1.0).abs() < 1e-3, "converged to {out}");
    }

    #[test]
    fn test_fast_motion_lags_less_with_beta() {
        let slow = FilterConfig { beta: 0.0, ..Default::default() };
        let fast = FilterConfig { beta: 1.0, ..Default::default() };
        let mut a = OneEuroFilter::new(slow);
        let mut b = OneEuroFilter::new(fast);
        a.filter(0.0, 0.0);
        b.filter(0.0, 0.0);
        let (mut ya, mut yb) = (0.0, 0.0);
        for i in 1..=5 {
            let t = i as f64 * 16.67;
            ya = a.filter(i as f32 * 10.0, t);
            yb = b.filter(i as f32 * 10.0, t);
        }
        assert!(yb > ya);
    }

    #[test]
    fn test_repeated_timestamp_holds_value() {
        let mut f = OneEuroFilter::new(FilterConfig::default());
        f.filter(1.0, 10.0);
        assert_eq!(f.filter(5.0, 10.0), 1.0);
    }

    #[test]
    fn test_reset_restores_pass_through() {
        let mut p = PointFilter::new(FilterConfig::default());
        p.filter(Vec3::ZERO, 0.0);
        p.filter(Vec3::ONE, 16.0);
        p.reset();
        assert_eq!(p.filter(Vec3::splat(3.0), 32.0), Vec3::splat(3.0));
    }

    proptest! {
        #[test]
        fn prop_output_stays_between_prev_and_input(
            start in -1.0f32..1.0, target in -1.0f32..1.0, dt in 1.0f64..100.0,
        ) {
            let mut f = OneEuroFilter::new(FilterConfig::default());
            f.filter(start, 0.0);
            let out = f.filter(target, dt);
            let (lo, hi) = if start < target { (start, target) } else { (target, start) };
            prop_assert!(out >= lo - 1e-6 && out <= hi + 1e-6);
        }
    }
}
