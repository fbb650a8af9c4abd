//! Fixed timestep entity pass
//!
//! Moves every entity once, in a fixed order (flyer, obstacles, pickups),
//! and reports what happened. Session rules are applied afterwards by the
//! orchestrator so its checks always see this step's positions.

use super::difficulty::Difficulty;
use super::state::{EntityId, World};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::tuning::Tuning;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Lift button is held; the flyer reacts to the press edge
    pub lift: bool,
    /// Idle/demo mode - the autopilot flies
    pub autopilot: bool,
}

/// Something an entity reports back from its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityNotice {
    ObstaclePassed(EntityId),
    PickupCollected(EntityId),
    /// Flyer died by its own rules (floor) or by obstacle contact
    FlyerDied,
}

/// Advance all entities by one step
pub fn step_entities(
    world: &mut World,
    input: &TickInput,
    difficulty: &Difficulty,
    tuning: &Tuning,
    dt: f32,
) -> Vec<EntityNotice> {
    let mut notices = Vec::new();

    let lift = if input.autopilot {
        autopilot_lift(world, tuning)
    } else {
        input.lift
    };

    let World {
        flyer,
        obstacles,
        pickups,
        ..
    } = world;

    if let Some(flyer) = flyer.as_mut() {
        if flyer.step(lift, dt, &tuning.flyer) {
            notices.push(EntityNotice::FlyerDied);
        }
    }

    for obstacle in obstacles.iter_mut() {
        let result = obstacle.step(
            dt,
            difficulty.scroll_speed,
            flyer.as_mut(),
            tuning.flyer.radius,
            &tuning.obstacle,
        );
        if result.hit_flyer {
            notices.push(EntityNotice::FlyerDied);
        }
        if result.passed {
            notices.push(EntityNotice::ObstaclePassed(obstacle.id));
        }
    }

    for pickup in pickups.iter_mut() {
        if pickup.step(
            dt,
            difficulty.scroll_speed,
            flyer.as_ref(),
            tuning.flyer.radius,
            &tuning.pickup,
        ) {
            notices.push(EntityNotice::PickupCollected(pickup.id));
        }
    }

    notices
}

/// Idle/demo pilot: lift when falling below the next gap's centre
pub fn autopilot_lift(world: &World, tuning: &Tuning) -> bool {
    let Some(flyer) = world.flyer.as_ref() else {
        return false;
    };
    if !flyer.is_alive() || flyer.vel_y < 0.0 {
        return false;
    }

    let geometry = &tuning.obstacle;
    let gap_centre_offset = (geometry.upper_gate_offset + geometry.lower_gate_offset) * 0.5;

    // Nearest obstacle whose right edge is not yet behind the flyer
    let target_y = world
        .live_obstacles()
        .filter(|o| o.pos.x + geometry.half_width >= flyer.pos.x - tuning.flyer.radius)
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
        .map(|o| o.pos.y + gap_centre_offset)
        .unwrap_or(tuning.flyer.spawn_y);

    // Lead the target slightly so the lift arc peaks near the centre
    flyer.pos.y > target_y + geometry.gap_height() * 0.1
}

/// Fixed-timestep accumulator.
///
/// Converts variable frame times into whole `SIM_DT` steps, capped at
/// `MAX_SUBSTEPS` per frame to prevent a spiral of death.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `frame_dt` and return how many steps to run now
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than carry it into the next frame
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Leftover time as a fraction of a step (for render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }
}
