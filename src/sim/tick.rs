//! Per-frame simulation tick
//!
//! Core game loop that advances a session deterministically.

use glam::Vec2;

use super::body;
use super::state::{GameOverCause, Session};
use super::steering::steer;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Point the head should turn toward (pointer position)
    pub drag_target: Option<Vec2>,
    /// Pointer pressed (finer, damped control)
    pub pointer_down: bool,
}

/// Advance the session by one frame of `frame_dt` seconds
pub fn tick(session: &mut Session, input: &TickInput, frame_dt: f32) {
    let dt = if frame_dt.is_finite() {
        frame_dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };

    match input.drag_target {
        Some(point) => session.chain.set_drag_target(point),
        None => session.chain.clear_drag_target(),
    }
    session.chain.set_pointer_down(input.pointer_down);

    // Initial seeding is spread over frames and keeps going behind notifications
    if session.seeding {
        session.seed_step();
    }

    // Don't simulate while a notification is up or after game over
    if !session.is_running() {
        return;
    }

    session.clock += dt;
    session.time_left -= dt;
    if session.time_left <= 0.0 {
        session.time_left = 0.0;
        session.end(GameOverCause::TimeUp);
        return;
    }

    let ramped = session.ramped();
    if !session.seeding {
        session.maintain_density();
    }

    steer(
        &mut session.chain,
        &session.board,
        &ramped,
        &session.tuning.steering,
        dt,
    );
    body::solve(&mut session.chain);
    session.check_collisions();
}
