//! Difficulty tiers and tuning tables
//!
//! The per-tier table uses the same keys as the shipped difficulty presets
//! (`TIMER_START`, `S0`, `DRIFT_AMP_MIN`, ...) so preset files load unchanged.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::error::ConfigError;

/// Difficulty tiers, ordered from easiest to hardest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Normal, Tier::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Normal => "normal",
            Tier::Hard => "hard",
        }
    }

    /// Capitalized name for notifications
    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Easy => "Easy",
            Tier::Normal => "Normal",
            Tier::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Tier::Easy),
            "normal" | "norm" => Some(Tier::Normal),
            "hard" => Some(Tier::Hard),
            _ => None,
        }
    }

    /// Like [`Tier::from_str`] but reports the unknown name
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::from_str(s).ok_or_else(|| ConfigError::UnknownTier(s.to_string()))
    }

    /// The tier a promotion leads to, if any
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Easy => Some(Tier::Normal),
            Tier::Normal => Some(Tier::Hard),
            Tier::Hard => None,
        }
    }
}

/// Drift amplitude/speed bounds and how many challenges it takes to reach them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftBounds {
    #[serde(rename = "DRIFT_AMP_MIN")]
    pub amp_min: f32,
    #[serde(rename = "DRIFT_AMP_MAX")]
    pub amp_max: f32,
    #[serde(rename = "DRIFT_SPEED_MIN")]
    pub speed_min: f32,
    #[serde(rename = "DRIFT_SPEED_MAX")]
    pub speed_max: f32,
    #[serde(rename = "DRIFT_RAMP_CHALLENGES")]
    pub ramp_challenges: u32,
}

/// Parameter record for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TierParams {
    /// Countdown at session start, promotion and resume (seconds)
    pub timer_start: f32,
    /// Seconds granted per matching capture (capped at `timer_start`)
    pub time_bonus_per_correct: f32,
    /// Seconds removed per penalized wrong capture (floored at zero)
    pub time_penalty_wrong: f32,
    /// Length lost per wrong capture, as a fraction of baseline length
    pub wrong_penalty: f32,
    /// Length regained per completed challenge, as a fraction of baseline length
    pub challenge_reward: f32,
    /// Head speed at challenge index 0 (px/s)
    #[serde(rename = "S0")]
    pub start_speed: f32,
    /// Head speed added per completed challenge
    pub speed_per_challenge: f32,
    #[serde(flatten)]
    pub drift: DriftBounds,
}

impl TierParams {
    pub fn easy() -> Self {
        Self {
            timer_start: 30.0,
            time_bonus_per_correct: 2.0,
            time_penalty_wrong: 1.0,
            wrong_penalty: 0.08,
            challenge_reward: 0.35,
            start_speed: 280.0,
            speed_per_challenge: 10.0,
            drift: DriftBounds {
                amp_min: 8.0,
                amp_max: 16.0,
                speed_min: 0.55,
                speed_max: 0.95,
                ramp_challenges: 14,
            },
        }
    }

    pub fn normal() -> Self {
        Self {
            timer_start: 25.0,
            time_bonus_per_correct: 1.0,
            time_penalty_wrong: 1.0,
            wrong_penalty: 0.10,
            challenge_reward: 0.30,
            start_speed: 300.0,
            speed_per_challenge: 12.0,
            drift: DriftBounds {
                amp_min: 15.0,
                amp_max: 25.0,
                speed_min: 0.95,
                speed_max: 1.70,
                ramp_challenges: 12,
            },
        }
    }

    pub fn hard() -> Self {
        Self {
            timer_start: 20.0,
            time_bonus_per_correct: 1.0,
            time_penalty_wrong: 2.0,
            wrong_penalty: 0.12,
            challenge_reward: 0.28,
            start_speed: 320.0,
            speed_per_challenge: 14.0,
            drift: DriftBounds {
                amp_min: 18.0,
                amp_max: 28.0,
                speed_min: 1.05,
                speed_max: 1.90,
                ramp_challenges: 10,
            },
        }
    }

    fn validate(&self, tier: Tier) -> Result<(), ConfigError> {
        let invalid = |field, reason| ConfigError::InvalidValue {
            tier,
            field,
            reason,
        };
        let values = [
            ("TIMER_START", self.timer_start),
            ("TIME_BONUS_PER_CORRECT", self.time_bonus_per_correct),
            ("TIME_PENALTY_WRONG", self.time_penalty_wrong),
            ("WRONG_PENALTY", self.wrong_penalty),
            ("CHALLENGE_REWARD", self.challenge_reward),
            ("S0", self.start_speed),
            ("SPEED_PER_CHALLENGE", self.speed_per_challenge),
            ("DRIFT_AMP_MIN", self.drift.amp_min),
            ("DRIFT_AMP_MAX", self.drift.amp_max),
            ("DRIFT_SPEED_MIN", self.drift.speed_min),
            ("DRIFT_SPEED_MAX", self.drift.speed_max),
        ];
        for (field, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be finite and non-negative"));
            }
        }
        if self.timer_start <= 0.0 {
            return Err(invalid("TIMER_START", "must be positive"));
        }
        if self.wrong_penalty > 1.0 {
            return Err(invalid("WRONG_PENALTY", "must not exceed 1"));
        }
        if self.drift.amp_max < self.drift.amp_min {
            return Err(invalid("DRIFT_AMP_MAX", "must be at least DRIFT_AMP_MIN"));
        }
        if self.drift.speed_max < self.drift.speed_min {
            return Err(invalid("DRIFT_SPEED_MAX", "must be at least DRIFT_SPEED_MIN"));
        }
        Ok(())
    }
}

/// One parameter record per tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub easy: TierParams,
    pub normal: TierParams,
    pub hard: TierParams,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: TierParams::easy(),
            normal: TierParams::normal(),
            hard: TierParams::hard(),
        }
    }
}

impl DifficultyTable {
    pub fn get(&self, tier: Tier) -> &TierParams {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Normal => &self.normal,
            Tier::Hard => &self.hard,
        }
    }

    /// Parse a bare `{ "easy": {...}, "normal": {...}, "hard": {...} }` table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: DifficultyTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in Tier::ALL {
            self.get(tier).validate(tier)?;
        }
        Ok(())
    }
}

/// Completed-challenge counts at which a tier hands over to the next one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub easy_until: u32,
    pub normal_until: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            easy_until: 15,
            normal_until: 30,
        }
    }
}

impl Progression {
    /// Threshold that ends `tier` (`None` for the last tier)
    pub fn until(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Easy => Some(self.easy_until),
            Tier::Normal => Some(self.normal_until),
            Tier::Hard => None,
        }
    }

    /// Single-step promotion for a session sitting in `current` with
    /// `completed` challenges behind it. Never returns a lower tier.
    pub fn promote(&self, current: Tier, completed: u32) -> Option<Tier> {
        let until = self.until(current)?;
        if completed >= until {
            current.next()
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.easy_until > self.normal_until {
            return Err(ConfigError::InvalidProgression {
                easy_until: self.easy_until,
                normal_until: self.normal_until,
            });
        }
        Ok(())
    }
}

/// Steering feel shared by all tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Autonomous intensity at challenge index 0
    pub auto_min: f32,
    /// Autonomous intensity once the autonomy ramp saturates
    pub auto_max: f32,
    pub auto_ramp_challenges: u32,
    /// Touch damping while the pointer is pressed (early / late)
    pub touch_damp_easy: f32,
    pub touch_damp_hard: f32,
    /// Near-field radius under which the head eases off (early / late)
    pub near_fade_easy: f32,
    pub near_fade_hard: f32,
    /// Ramp length for damping and near-field radius
    pub touch_ramp_challenges: u32,
    /// Turn rates (rad/s) while idle and while the pointer is pressed
    pub turn_rate_passive: f32,
    pub turn_rate_active: f32,
    /// Turn boost per pixel of distance to the drag target
    pub follow_dist_boost: f32,
    /// Cap on the distance boost
    pub max_dist_boost: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            auto_min: 0.30,
            auto_max: 0.90,
            auto_ramp_challenges: 16,
            touch_damp_easy: 0.80,
            touch_damp_hard: 0.45,
            near_fade_easy: 18.0,
            near_fade_hard: 28.0,
            touch_ramp_challenges: 16,
            turn_rate_passive: PI,
            turn_rate_active: PI * 2.2,
            follow_dist_boost: 1.0 / 160.0,
            max_dist_boost: 2.5,
        }
    }
}

impl SteeringParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("auto_min", self.auto_min),
            ("auto_max", self.auto_max),
            ("touch_damp_easy", self.touch_damp_easy),
            ("touch_damp_hard", self.touch_damp_hard),
            ("near_fade_easy", self.near_fade_easy),
            ("near_fade_hard", self.near_fade_hard),
            ("turn_rate_passive", self.turn_rate_passive),
            ("turn_rate_active", self.turn_rate_active),
            ("follow_dist_boost", self.follow_dist_boost),
            ("max_dist_boost", self.max_dist_boost),
        ];
        for (field, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidSteering { field });
            }
        }
        Ok(())
    }
}

/// Everything a session needs to know about balance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulties: DifficultyTable,
    pub progression: Progression,
    pub steering: SteeringParams,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning ({} tiers)", Tier::ALL.len());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.difficulties.validate()?;
        self.progression.validate()?;
        self.steering.validate()
    }

    pub fn params(&self, tier: Tier) -> &TierParams {
        self.difficulties.get(tier)
    }
}
