//! Proximity geometry: head-to-target capture, point-to-polyline distance,
//! and circle-vs-rectangle overlap for UI exclusion zones.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Target;

/// Axis-aligned rectangle in board space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Grow on every side by `pad`
    pub fn inflate(&self, pad: f32) -> Self {
        Self::new(
            self.left - pad,
            self.top - pad,
            self.right + pad,
            self.bottom + pad,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Closest point of the rectangle (edges or interior) to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.left, self.right),
            p.y.clamp(self.top, self.bottom),
        )
    }
}

/// Exact circle-vs-rectangle test. Touching does not count as overlap.
pub fn circle_overlaps_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    if rect.contains(center) {
        return true;
    }
    center.distance_squared(rect.closest_point(center)) < radius * radius
}

/// Closest point on segment `a`-`b` to `p`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let line_vec = b - a;
    let line_len_sq = line_vec.length_squared();
    if line_len_sq < 1e-8 {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    a + line_vec * t
}

#[inline]
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Shortest distance from `p` to the polyline through `points`.
/// Infinite when there is no segment to measure against.
pub fn distance_to_polyline(p: Vec2, points: &[Vec2]) -> f32 {
    points
        .windows(2)
        .map(|pair| distance_to_segment(p, pair[0], pair[1]))
        .fold(f32::INFINITY, f32::min)
}

/// A head-to-target capture found this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture {
    /// Arena slot of the captured target
    pub slot: usize,
    /// Drifted position at the moment of capture
    pub position: Vec2,
    pub distance: f32,
}

/// First live target (in iteration order) whose drifted position at `t` is
/// within its capture radius of `head`. Overlapping targets resolve to the
/// earliest slot.
pub fn find_capture<'a, I>(head: Vec2, targets: I, t: f32) -> Option<Capture>
where
    I: IntoIterator<Item = (usize, &'a Target)>,
{
    targets.into_iter().find_map(|(slot, target)| {
        if !target.alive {
            return None;
        }
        let position = target.position(t);
        let distance = head.distance(position);
        (distance <= target.capture_radius()).then_some(Capture {
            slot,
            position,
            distance,
        })
    })
}
