//! Head steering and locomotion
//!
//! The head always moves along its heading. A drag target only bends the
//! heading, at a limited turn rate, and pressing the pointer trades raw
//! speed for control near the target.

use glam::Vec2;

use super::ramp::RampedParams;
use super::state::{Board, Chain};
use crate::consts::HEAD_RADIUS;
use crate::tuning::SteeringParams;
use crate::{angle_of, shortest_angle};

/// Turn-rate multiplier from the distance to the drag target. Far targets
/// turn faster; no target at all gets the full boost.
pub fn distance_boost(distance: Option<f32>, params: &SteeringParams) -> f32 {
    let boost = match distance {
        Some(d) => (d * params.follow_dist_boost).clamp(0.0, params.max_dist_boost),
        None => params.max_dist_boost,
    };
    1.0 + boost
}

/// Speed multiplier for this tick
pub fn autonomy(distance: Option<f32>, pointer_down: bool, ramped: &RampedParams) -> f32 {
    if !pointer_down {
        return ramped.auto_intensity;
    }
    let fade = match distance {
        Some(d) if ramped.near_fade_radius > 0.0 => (d / ramped.near_fade_radius).clamp(0.0, 1.0),
        _ => 1.0,
    };
    ramped.auto_intensity * ramped.touch_damping * fade
}

/// Advance the head one tick. Only the head moves; the body follows in
/// [`super::body::solve`].
pub fn steer(
    chain: &mut Chain,
    board: &Board,
    ramped: &RampedParams,
    params: &SteeringParams,
    dt: f32,
) {
    let head = chain.head();
    let distance = chain.drag_target.map(|target| head.distance(target));

    // Desired heading
    let desired = chain
        .drag_target
        .and_then(|target| (target - head).try_normalize())
        .unwrap_or(chain.heading);

    // Turn-rate limited rotation toward it
    let base_turn = if chain.pointer_down {
        params.turn_rate_active
    } else {
        params.turn_rate_passive
    };
    let budget = base_turn * distance_boost(distance, params) * dt;
    let delta = shortest_angle(angle_of(chain.heading), angle_of(desired)).clamp(-budget, budget);
    chain.heading = Vec2::from_angle(delta)
        .rotate(chain.heading)
        .try_normalize()
        .unwrap_or(chain.heading);

    chain.speed = ramped.speed;
    let step = chain.speed * autonomy(distance, chain.pointer_down, ramped) * dt;
    let moved = head + chain.heading * step;
    chain.segments[0] = bounce(moved, &mut chain.heading, board);
}

/// Clamp `pos` to the head margin and point the heading back inward on any
/// axis that was violated. Speed is untouched.
fn bounce(mut pos: Vec2, heading: &mut Vec2, board: &Board) -> Vec2 {
    let max_x = (board.width - HEAD_RADIUS).max(HEAD_RADIUS);
    let max_y = (board.height - HEAD_RADIUS).max(HEAD_RADIUS);

    if pos.x < HEAD_RADIUS {
        pos.x = HEAD_RADIUS;
        heading.x = heading.x.abs();
    } else if pos.x > max_x {
        pos.x = max_x;
        heading.x = -heading.x.abs();
    }
    if pos.y < HEAD_RADIUS {
        pos.y = HEAD_RADIUS;
        heading.y = heading.y.abs();
    } else if pos.y > max_y {
        pos.y = max_y;
        heading.y = -heading.y.abs();
    }
    pos
}
