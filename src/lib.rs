//! Neon Snake - a neon pursuit arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (steering, body, spawning, challenges)
//! - `tuning`: Data-driven difficulty tiers and promotion thresholds
//! - `error`: Configuration errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use tuning::{DifficultyTable, DriftBounds, Progression, SteeringParams, Tier, TierParams, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Longest frame delta the simulation will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Distance between consecutive chain segments
    pub const SEGMENT_SPACING: f32 = 6.0;
    /// Head bounce margin from every board edge (keeps the whole head visible)
    pub const HEAD_RADIUS: f32 = 18.0;
    /// Chain baseline length bounds (derived from board size)
    pub const MIN_BASE_LENGTH: f32 = 220.0;
    pub const MAX_BASE_LENGTH: f32 = 360.0;
    /// Baseline length as a fraction of the shorter board side
    pub const BASE_LENGTH_FRACTION: f32 = 0.45;

    /// Score per matching capture
    pub const SCORE_PER_CORRECT: u64 = 10;
    /// Captures required per challenge
    pub const CHALLENGE_SIZE: u32 = 3;
    /// Live matching targets the board must always offer
    pub const REQUIRED_MATCHES: usize = 3;
    /// Random spawns granted when a challenge completes
    pub const COMPLETION_BURST: usize = 3;

    /// Wrong-hit cooldown (seconds of simulation time)
    pub const WRONG_GRACE_SECS: f32 = 0.3;
    /// Red flash after a penalized wrong hit
    pub const FLASH_WRONG_SECS: f32 = 0.15;
    /// Green pulse after a matching capture
    pub const PULSE_GOOD_SECS: f32 = 0.18;
    /// Challenge / promotion notification duration
    pub const NOTIFY_MS: u32 = 3000;

    /// Padding added around every target for placement
    pub const PLACEMENT_PADDING: f32 = 6.0;
    /// Random trials per spawn request
    pub const ATTEMPTS_PER_SPAWN: u32 = 120;
    /// Minimum gap between a new target's envelope and the chain body
    pub const TAIL_CLEARANCE: f32 = 8.0;
    /// Consecutive placement failures before the criterion is rerolled
    pub const GUARANTEE_FAILURE_LIMIT: u32 = 20;
    /// Rerolls attempted before the guarantee gives up for this rotation
    pub const MAX_CRITERION_REROLLS: u32 = 8;

    /// Spawn attempts per frame while the board is being seeded
    pub const SEED_BATCH: usize = 8;
    /// Spawns per tick while topping the board back up to density
    pub const DENSITY_BATCH: usize = 2;
    /// Board area per target when computing density
    pub const AREA_PER_TARGET: f32 = 19_000.0;
    pub const MIN_TARGETS: usize = 14;
    pub const MAX_TARGETS: usize = 28;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation taking angle `from` to angle `to`
#[inline]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Heading angle of a direction vector
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
