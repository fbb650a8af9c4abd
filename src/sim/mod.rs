//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies (wall-clock time only for stats)

pub mod collision;
pub mod difficulty;
pub mod events;
pub mod session;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Aabb, first_obstacle_hit, flyer_hits_obstacle, flyer_touches_barriers, out_of_bounds};
pub use difficulty::{Difficulty, DifficultyScaler, MAX_DIFFICULTY_LEVEL, difficulty_level, scale};
pub use events::{EventBus, GameEvent, SubscriptionId};
pub use session::{Clock, GameSession, SystemClock};
pub use spawner::{FirstSpawn, ObstacleSpawner, PickupSpawner, SpawnTimer};
pub use state::{EntityId, Flyer, Obstacle, ObstacleStep, Pickup, SessionState, World};
pub use tick::{EntityNotice, FixedStep, TickInput, autopilot_lift, step_entities};
