//! Difficulty ramps keyed by the challenge index

use serde::{Deserialize, Serialize};

use crate::tuning::{Tier, Tuning};

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Eased ramp position in [0, 1].
///
/// Zero at index 0 whatever the ramp length; a zero-length ramp is saturated
/// as soon as one challenge has been completed.
pub fn ramp_factor(index: u32, ramp_length: u32) -> f32 {
    if index == 0 {
        return 0.0;
    }
    if ramp_length == 0 {
        return 1.0;
    }
    let t = (index as f32 / ramp_length as f32).clamp(0.0, 1.0);
    ease_out_cubic(t)
}

/// Bounds new drifts are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftRange {
    pub amp_min: f32,
    pub amp_max: f32,
    pub speed_min: f32,
    pub speed_max: f32,
}

/// Every ramp-driven value for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampedParams {
    pub drift: DriftRange,
    /// Autonomous pursuit intensity
    pub auto_intensity: f32,
    /// Autonomy multiplier while the pointer is pressed
    pub touch_damping: f32,
    /// Distance under which a pressed pointer slows the head
    pub near_fade_radius: f32,
    /// Head speed (grows without bound with the index)
    pub speed: f32,
}

impl RampedParams {
    /// Evaluate the ramps of `tier` at challenge `index`. The index is the
    /// same across tiers, so promotion swaps the bounds but keeps the position.
    pub fn at(tuning: &Tuning, tier: Tier, index: u32) -> Self {
        let params = tuning.params(tier);
        let steering = &tuning.steering;

        let p_drift = ramp_factor(index, params.drift.ramp_challenges);
        let p_auto = ramp_factor(index, steering.auto_ramp_challenges);
        let p_touch = ramp_factor(index, steering.touch_ramp_challenges);

        Self {
            drift: DriftRange {
                amp_min: params.drift.amp_min,
                amp_max: lerp(params.drift.amp_min, params.drift.amp_max, p_drift),
                speed_min: params.drift.speed_min,
                speed_max: lerp(params.drift.speed_min, params.drift.speed_max, p_drift),
            },
            auto_intensity: lerp(steering.auto_min, steering.auto_max, p_auto),
            touch_damping: lerp(steering.touch_damp_easy, steering.touch_damp_hard, p_touch),
            near_fade_radius: lerp(steering.near_fade_easy, steering.near_fade_hard, p_touch),
            speed: params.start_speed + index as f32 * params.speed_per_challenge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp_factor(0, 12), 0.0);
        assert_eq!(ramp_factor(0, 0), 0.0);
        assert_eq!(ramp_factor(5, 0), 1.0);
        assert_eq!(ramp_factor(12, 12), 1.0);
        assert_eq!(ramp_factor(500, 12), 1.0);
        // Ease-out: halfway through the ramp is well past halfway up
        assert!((ramp_factor(6, 12) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_ramped_params_at_start() {
        let tuning = Tuning::default();
        let ramped = RampedParams::at(&tuning, Tier::Normal, 0);
        assert_eq!(ramped.drift.amp_min, 15.0);
        assert_eq!(ramped.drift.amp_max, 15.0);
        assert_eq!(ramped.drift.speed_max, ramped.drift.speed_min);
        assert!((ramped.auto_intensity - 0.30).abs() < 1e-6);
        assert!((ramped.touch_damping - 0.80).abs() < 1e-6);
        assert!((ramped.near_fade_radius - 18.0).abs() < 1e-6);
        assert_eq!(ramped.speed, 300.0);
    }

    #[test]
    fn test_ramped_params_saturate() {
        let tuning = Tuning::default();
        let ramped = RampedParams::at(&tuning, Tier::Hard, 40);
        assert!((ramped.drift.amp_max - 28.0).abs() < 1e-4);
        assert!((ramped.drift.speed_max - 1.90).abs() < 1e-4);
        assert!((ramped.auto_intensity - 0.90).abs() < 1e-4);
        assert!((ramped.touch_damping - 0.45).abs() < 1e-4);
        assert_eq!(ramped.speed, 320.0 + 40.0 * 14.0);
    }

    #[test]
    fn test_ramps_saturate_at_their_own_pace() {
        // Drift ramp (12 on normal) is done before the autonomy ramp (16)
        let tuning = Tuning::default();
        let ramped = RampedParams::at(&tuning, Tier::Normal, 12);
        assert!((ramped.drift.amp_max - 25.0).abs() < 1e-4);
        assert!(ramped.auto_intensity < 0.90 - 1e-3);
    }

    proptest! {
        #[test]
        fn prop_ramp_bounded_and_monotonic(index in 0u32..200, len in 0u32..50) {
            let a = ramp_factor(index, len);
            let b = ramp_factor(index + 1, len);
            prop_assert!((0.0..=1.0).contains(&a));
            prop_assert!(b >= a);
        }

        #[test]
        fn prop_ramped_speed_grows_with_index(index in 0u32..500) {
            let tuning = Tuning::default();
            for tier in Tier::ALL {
                let now = RampedParams::at(&tuning, tier, index);
                let next = RampedParams::at(&tuning, tier, index + 1);
                prop_assert!(next.speed > now.speed);
                prop_assert!(next.drift.amp_max >= now.drift.amp_max);
                prop_assert!(next.auto_intensity >= now.auto_intensity);
            }
        }
    }
}
