//! Session state and entity types
//!
//! Entities own their per-step motion and self-destruction rules. They never
//! touch the session state; anything the orchestrator must know about is
//! reported back from the step call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circle_circle_overlap, flyer_touches_barriers};
use crate::tuning::{FlyerTuning, ObstacleTuning, PickupTuning};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Not playing; nothing moves
    #[default]
    Menu,
    /// Active session
    Playing,
    /// Session ended, waiting for restart or menu
    GameOver,
}

/// Registry-assigned entity id
pub type EntityId = u32;

/// The player-controlled entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flyer {
    pub pos: Vec2,
    /// Vertical velocity (positive is down)
    pub vel_y: f32,
    /// Visual tilt derived from velocity; never read by gameplay
    pub rotation: f32,
    alive: bool,
    on_floor: bool,
    /// Lift input seen on the previous step, for edge detection
    lift_held: bool,
}

impl Flyer {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            vel_y: 0.0,
            rotation: 0.0,
            alive: true,
            on_floor: false,
            lift_held: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn on_floor(&self) -> bool {
        self.on_floor
    }

    /// Kill the flyer. Returns true only on the alive → dead transition.
    pub fn kill(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        true
    }

    /// Back to life at `spawn`, motionless
    pub fn revive(&mut self, spawn: Vec2) {
        *self = Self::new(spawn);
    }

    /// Advance one step. Returns true if the flyer died during this step.
    pub fn step(&mut self, lift: bool, dt: f32, tuning: &FlyerTuning) -> bool {
        let lift_edge = lift && !self.lift_held;
        self.lift_held = lift;

        if !self.alive {
            return false;
        }

        if lift_edge {
            self.vel_y = tuning.lift_velocity;
            self.on_floor = false;
        } else if !self.on_floor {
            self.vel_y += tuning.gravity * dt;
        }

        self.rotation = (self.vel_y * tuning.rotation_per_velocity)
            .clamp(tuning.max_rotation_up, tuning.max_rotation_down);

        self.pos.y += self.vel_y * dt;

        if self.pos.y >= tuning.ground_y {
            self.pos.y = tuning.ground_y;
            self.vel_y = 0.0;
            self.on_floor = true;
        }

        if self.on_floor {
            return self.kill();
        }
        false
    }
}

/// What happened to an obstacle during its step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObstacleStep {
    /// Crossed the scoring line this step
    pub passed: bool,
    /// Killed the flyer by direct contact this step
    pub hit_flyer: bool,
}

/// A gate: upper and lower barriers around a vertical gap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    /// Gap anchor; barrier edges are offsets from `pos.y`
    pub pos: Vec2,
    passed: bool,
    hit_flyer: bool,
    #[serde(skip)]
    removed: bool,
}

impl Obstacle {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            passed: false,
            hit_flyer: false,
            removed: false,
        }
    }

    pub fn has_been_passed(&self) -> bool {
        self.passed
    }

    pub fn has_hit_flyer(&self) -> bool {
        self.hit_flyer
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Mark for removal at the next sweep
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Scroll left, test direct contact, then score and despawn lines.
    pub fn step(
        &mut self,
        dt: f32,
        scroll_speed: f32,
        flyer: Option<&mut Flyer>,
        flyer_radius: f32,
        geometry: &ObstacleTuning,
    ) -> ObstacleStep {
        let mut result = ObstacleStep::default();
        if self.removed {
            return result;
        }

        self.pos.x -= scroll_speed * dt;

        if !self.hit_flyer {
            if let Some(flyer) = flyer {
                if flyer.is_alive()
                    && flyer_touches_barriers(flyer.pos, flyer_radius, self.pos, geometry)
                {
                    self.hit_flyer = true;
                    result.hit_flyer = flyer.kill();
                }
            }
        }

        if !self.passed && self.pos.x < geometry.passed_x {
            self.passed = true;
            result.passed = true;
        }

        if self.pos.x < geometry.despawn_x {
            self.removed = true;
        }

        result
    }
}

/// A bonus item collected by contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    /// Bob centre line
    pub baseline_y: f32,
    /// Bob phase (radians)
    pub phase: f32,
    collected: bool,
    #[serde(skip)]
    removed: bool,
}

impl Pickup {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            baseline_y: pos.y,
            phase: 0.0,
            collected: false,
            removed: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Collect on contact with a live flyer. Returns true the first time only.
    pub fn try_collect(&mut self, flyer: &Flyer, flyer_radius: f32, tuning: &PickupTuning) -> bool {
        if self.collected || self.removed || !flyer.is_alive() {
            return false;
        }
        if !circle_circle_overlap(self.pos, tuning.radius, flyer.pos, flyer_radius) {
            return false;
        }
        self.collected = true;
        self.removed = true;
        true
    }

    /// Scroll left with a sine bob. Returns true if collected this step.
    pub fn step(
        &mut self,
        dt: f32,
        scroll_speed: f32,
        flyer: Option<&Flyer>,
        flyer_radius: f32,
        tuning: &PickupTuning,
    ) -> bool {
        if self.removed {
            return false;
        }

        self.pos.x -= scroll_speed * dt;
        if tuning.bob_amplitude != 0.0 {
            self.phase = (self.phase + tuning.bob_frequency * dt) % std::f32::consts::TAU;
            self.pos.y = self.baseline_y + tuning.bob_amplitude * self.phase.sin();
        }

        if self.pos.x < tuning.despawn_x {
            self.removed = true;
            return false;
        }

        flyer.is_some_and(|flyer| self.try_collect(flyer, flyer_radius, tuning))
    }
}

/// Entity registry with deferred deletion.
///
/// Entities are only ever marked during a step; `sweep` drops them at the
/// frame boundary. Iteration order is spawn order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub flyer: Option<Flyer>,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    next_id: EntityId,
}

impl World {
    pub fn new(flyer: Option<Flyer>) -> Self {
        Self {
            flyer,
            obstacles: Vec::new(),
            pickups: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_obstacle(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle::new(id, pos));
        id
    }

    pub fn spawn_pickup(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.pickups.push(Pickup::new(id, pos));
        id
    }

    /// Obstacles not marked for removal
    pub fn live_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| !o.is_removed())
    }

    /// Pickups not marked for removal
    pub fn live_pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter().filter(|p| !p.is_removed())
    }

    /// Drop everything marked for removal
    pub fn sweep(&mut self) {
        self.obstacles.retain(|o| !o.is_removed());
        self.pickups.retain(|p| !p.is_removed());
    }
}
