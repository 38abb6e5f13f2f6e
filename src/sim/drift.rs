//! Oscillatory drift for targets
//!
//! Each axis is an independent sine around the anchor. The y axis runs at
//! `ratio` times the x frequency so paths trace open Lissajous curves, but
//! both axes stay within `amp` of the anchor; placement relies on that bound.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::ramp::DriftRange;

/// Axis frequency ratios a drift may use
pub const FREQUENCY_RATIOS: [f32; 3] = [1.0, 2.0 / 3.0, 3.0 / 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    pub amp: f32,
    /// Angular speed (rad/s) of the x axis
    pub speed: f32,
    /// y frequency / x frequency
    pub ratio: f32,
    pub phase_x: f32,
    pub phase_y: f32,
}

impl Drift {
    /// No motion at all
    pub const STILL: Drift = Drift {
        amp: 0.0,
        speed: 0.0,
        ratio: 1.0,
        phase_x: 0.0,
        phase_y: 0.0,
    };

    /// Draw a drift within the current ramped bounds
    pub fn random<R: Rng + ?Sized>(rng: &mut R, range: &DriftRange) -> Self {
        Self {
            amp: rng.random_range(range.amp_min..=range.amp_max),
            speed: rng.random_range(range.speed_min..=range.speed_max),
            ratio: FREQUENCY_RATIOS[rng.random_range(0..FREQUENCY_RATIOS.len())],
            phase_x: rng.random_range(0.0..TAU),
            phase_y: rng.random_range(0.0..TAU),
        }
    }

    /// Displacement from the anchor at time `t` (seconds)
    #[inline]
    pub fn offset(&self, t: f32) -> Vec2 {
        Vec2::new(
            self.amp * (self.speed * t + self.phase_x).sin(),
            self.amp * (self.speed * self.ratio * t + self.phase_y).sin(),
        )
    }

    #[inline]
    pub fn position(&self, anchor: Vec2, t: f32) -> Vec2 {
        anchor + self.offset(t)
    }
}
