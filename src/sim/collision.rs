//! Collision and bounds geometry
//!
//! Two independent contact layers exist for flyer vs. obstacle:
//! the obstacle's own circle-vs-barrier test during its step, and the
//! orchestrator's conservative box-vs-gap poll after all entities moved.
//! Either may fire first; killing an already dead flyer is a no-op.

use glam::Vec2;

use crate::tuning::{ArenaTuning, ObstacleTuning};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Upper and lower barriers of an obstacle anchored at `anchor`.
///
/// Barriers extend to infinity away from the gap, so a flyer above the
/// screen still touches the upper one.
pub fn barrier_rects(anchor: Vec2, geometry: &ObstacleTuning) -> [Aabb; 2] {
    let left = anchor.x - geometry.half_width;
    let right = anchor.x + geometry.half_width;
    [
        Aabb::new(
            Vec2::new(left, f32::NEG_INFINITY),
            Vec2::new(right, anchor.y + geometry.upper_gate_offset),
        ),
        Aabb::new(
            Vec2::new(left, anchor.y + geometry.lower_gate_offset),
            Vec2::new(right, f32::INFINITY),
        ),
    ]
}

/// Circle vs. rectangle overlap (touching counts)
pub fn circle_aabb_overlap(center: Vec2, radius: f32, rect: &Aabb) -> bool {
    rect.closest_point(center).distance_squared(center) <= radius * radius
}

/// Circle vs. circle overlap (touching counts)
#[inline]
pub fn circle_circle_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Entity-local contact: does the flyer's circle touch either barrier?
pub fn flyer_touches_barriers(
    flyer_pos: Vec2,
    flyer_radius: f32,
    anchor: Vec2,
    geometry: &ObstacleTuning,
) -> bool {
    barrier_rects(anchor, geometry)
        .iter()
        .any(|rect| circle_aabb_overlap(flyer_pos, flyer_radius, rect))
}

/// Is the flyer horizontally within reach of the obstacle?
#[inline]
pub fn in_horizontal_range(
    flyer_x: f32,
    flyer_radius: f32,
    obstacle_x: f32,
    geometry: &ObstacleTuning,
) -> bool {
    (flyer_x - obstacle_x).abs() < flyer_radius + geometry.half_width
}

/// Polled gap test: the flyer's vertical span leaves the obstacle's gap.
/// Strict on both edges; a span exactly on an edge is still inside.
pub fn outside_gap(flyer_y: f32, flyer_radius: f32, obstacle_y: f32, geometry: &ObstacleTuning) -> bool {
    flyer_y - flyer_radius < obstacle_y + geometry.upper_gate_offset
        || flyer_y + flyer_radius > obstacle_y + geometry.lower_gate_offset
}

/// Orchestrator-side check: horizontal overlap and span outside the gap
pub fn flyer_hits_obstacle(
    flyer_pos: Vec2,
    flyer_radius: f32,
    obstacle_pos: Vec2,
    geometry: &ObstacleTuning,
) -> bool {
    in_horizontal_range(flyer_pos.x, flyer_radius, obstacle_pos.x, geometry)
        && outside_gap(flyer_pos.y, flyer_radius, obstacle_pos.y, geometry)
}

/// Index of the first obstacle (in the given order) the flyer hits
pub fn first_obstacle_hit<I>(
    flyer_pos: Vec2,
    flyer_radius: f32,
    obstacles: I,
    geometry: &ObstacleTuning,
) -> Option<usize>
where
    I: IntoIterator<Item = Vec2>,
{
    obstacles
        .into_iter()
        .position(|pos| flyer_hits_obstacle(flyer_pos, flyer_radius, pos, geometry))
}

/// Playfield check on the flyer's center
#[inline]
pub fn out_of_bounds(flyer_y: f32, arena: &ArenaTuning) -> bool {
    flyer_y < arena.upper_bound || flyer_y > arena.lower_bound
}
