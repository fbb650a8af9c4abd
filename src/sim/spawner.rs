//! Timed obstacle and pickup spawners
//!
//! The obstacle spawner fires immediately on start and then once per
//! interval. The pickup spawner waits a full interval before its first
//! roll, so when both share the difficulty interval each pickup roll lands
//! on the same step as a fresh obstacle and is placed inside its gap.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{EntityId, World};
use crate::tuning::{ObstacleTuning, PickupTuning};

/// When the first spawn happens after `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstSpawn {
    Immediate,
    AfterInterval,
}

/// Repeating interval timer with start/stop
#[derive(Debug, Clone)]
pub struct SpawnTimer {
    interval: f32,
    elapsed: f32,
    running: bool,
    first: FirstSpawn,
    pending_first: bool,
}

impl SpawnTimer {
    pub fn new(interval: f32, first: FirstSpawn) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            running: false,
            first,
            pending_first: false,
        }
    }

    /// Reset counters and begin firing
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
        self.pending_first = self.first == FirstSpawn::Immediate;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.pending_first = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Change cadence without losing accumulated time
    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval;
    }

    /// Advance by `dt` and return how many times the timer fired
    pub fn update(&mut self, dt: f32) -> u32 {
        if !self.running {
            return 0;
        }
        let mut fired = 0;
        if self.pending_first {
            self.pending_first = false;
            fired += 1;
        }
        if self.interval <= 0.0 {
            return fired;
        }
        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            fired += 1;
        }
        fired
    }
}

/// Spawns gate obstacles at a random gap height
#[derive(Debug, Clone)]
pub struct ObstacleSpawner {
    timer: SpawnTimer,
    rng: Pcg32,
    geometry: ObstacleTuning,
    last_gap_y: Option<f32>,
}

impl ObstacleSpawner {
    pub fn new(interval: f32, geometry: ObstacleTuning, seed: u64) -> Self {
        Self {
            timer: SpawnTimer::new(interval, FirstSpawn::Immediate),
            rng: Pcg32::seed_from_u64(seed),
            geometry,
            last_gap_y: None,
        }
    }

    pub fn start_spawning(&mut self) {
        self.last_gap_y = None;
        self.timer.start();
    }

    /// Halt production; live obstacles keep moving
    pub fn stop_spawning(&mut self) {
        self.timer.stop();
    }

    pub fn is_spawning(&self) -> bool {
        self.timer.is_running()
    }

    pub fn set_spawn_interval(&mut self, interval: f32) {
        self.timer.set_interval(interval);
    }

    pub fn spawn_interval(&self) -> f32 {
        self.timer.interval()
    }

    /// Gap anchor of the most recently spawned obstacle
    pub fn last_gap_y(&self) -> Option<f32> {
        self.last_gap_y
    }

    /// Destroy every obstacle in the world
    pub fn clear_all(&self, world: &mut World) {
        world.obstacles.clear();
    }

    /// Advance the timer and spawn into `world`
    pub fn update(&mut self, dt: f32, world: &mut World) -> Vec<EntityId> {
        let fired = self.timer.update(dt);
        (0..fired).map(|_| self.spawn(world)).collect()
    }

    fn spawn(&mut self, world: &mut World) -> EntityId {
        let gap_y = self
            .rng
            .random_range(self.geometry.min_gap_y..=self.geometry.max_gap_y);
        self.last_gap_y = Some(gap_y);
        let id = world.spawn_obstacle(Vec2::new(self.geometry.spawn_x, gap_y));
        log::trace!("Spawned obstacle {} with gap anchor {:.1}", id, gap_y);
        id
    }
}

/// Spawns pickups inside the latest obstacle's gap
#[derive(Debug, Clone)]
pub struct PickupSpawner {
    timer: SpawnTimer,
    rng: Pcg32,
    geometry: ObstacleTuning,
    tuning: PickupTuning,
}

impl PickupSpawner {
    pub fn new(interval: f32, geometry: ObstacleTuning, tuning: PickupTuning, seed: u64) -> Self {
        Self {
            timer: SpawnTimer::new(interval, FirstSpawn::AfterInterval),
            // Separate stream so pickups don't perturb obstacle layout
            rng: Pcg32::new(seed, 0x0a02_bdbf_7bb3_c0a7),
            geometry,
            tuning,
        }
    }

    pub fn start_spawning(&mut self) {
        self.timer.start();
    }

    pub fn stop_spawning(&mut self) {
        self.timer.stop();
    }

    pub fn is_spawning(&self) -> bool {
        self.timer.is_running()
    }

    pub fn set_spawn_interval(&mut self, interval: f32) {
        self.timer.set_interval(interval);
    }

    pub fn spawn_interval(&self) -> f32 {
        self.timer.interval()
    }

    /// Destroy every pickup in the world
    pub fn clear_all(&self, world: &mut World) {
        world.pickups.clear();
    }

    /// Vertical band a pickup may occupy for a given gap anchor
    pub fn placement_range(&self, gap_y: f32) -> (f32, f32) {
        (
            gap_y + self.geometry.upper_gate_offset + self.tuning.gap_margin,
            gap_y + self.geometry.lower_gate_offset - self.tuning.gap_margin,
        )
    }

    /// Advance the timer; each tick rolls the spawn chance.
    ///
    /// Nothing spawns until an obstacle exists to anchor the placement.
    pub fn update(&mut self, dt: f32, world: &mut World, last_gap_y: Option<f32>) -> Vec<EntityId> {
        let fired = self.timer.update(dt);
        let Some(gap_y) = last_gap_y else {
            return Vec::new();
        };
        let mut spawned = Vec::new();
        for _ in 0..fired {
            if !self.rng.random_bool(f64::from(self.tuning.spawn_chance)) {
                continue;
            }
            let (min_y, max_y) = self.placement_range(gap_y);
            let y = self.rng.random_range(min_y..=max_y);
            let id = world.spawn_pickup(Vec2::new(self.geometry.spawn_x, y));
            log::trace!("Spawned pickup {} at y={:.1}", id, y);
            spawned.push(id);
        }
        spawned
    }
}
