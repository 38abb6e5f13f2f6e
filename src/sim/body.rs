//! Follow-the-leader body solver

use glam::Vec2;

use super::state::Chain;
use crate::consts::SEGMENT_SPACING;

/// One relaxation pass: pull each segment toward its (already updated)
/// predecessor until they are exactly `spacing` apart. Coincident points
/// stay where they are.
pub fn relax(segments: &mut [Vec2], spacing: f32) {
    for i in 1..segments.len() {
        let delta = segments[i - 1] - segments[i];
        let dist = delta.length();
        if dist > f32::EPSILON {
            segments[i] += delta / dist * (dist - spacing);
        }
    }
}

/// Segment count for a length budget
#[inline]
pub fn segment_count(length: f32, spacing: f32) -> usize {
    ((length / spacing).round().max(0.0) as usize).max(2)
}

/// Truncate, or grow by repeating the tail point
pub fn resize(segments: &mut Vec<Vec2>, length: f32, spacing: f32) {
    let count = segment_count(length, spacing);
    let tail = segments.last().copied().unwrap_or_default();
    segments.resize(count, tail);
}

/// Run the solver for one tick
pub fn solve(chain: &mut Chain) {
    relax(&mut chain.segments, SEGMENT_SPACING);
    resize(&mut chain.segments, chain.length, SEGMENT_SPACING);
}
