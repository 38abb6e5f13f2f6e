//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied frame delta, clamped
//! - Seeded RNG only
//! - Stable iteration order (live targets by spawn order)
//! - No rendering or platform dependencies

pub mod body;
pub mod challenge;
pub mod collision;
pub mod drift;
pub mod ramp;
pub mod spawn;
pub mod state;
pub mod steering;
pub mod tick;

pub use collision::{Capture, Rect, circle_overlaps_rect, distance_to_polyline, find_capture};
pub use drift::Drift;
pub use ramp::{DriftRange, RampedParams, ramp_factor};
pub use spawn::PlacementContext;
pub use state::{
    Board, Chain, ChainTint, Challenge, GameEvent, GameOverCause, GamePhase, Hue, Kind, Session,
    Shape, Size, Target, TargetArena,
};
pub use steering::steer;
pub use tick::{TickInput, tick};
