//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in as a `now` argument (ms), never read from the system
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entity vectors)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod food;
pub mod grid;
pub mod hazards;
pub mod state;
pub mod tick;

pub use autopilot::autopilot_keys;
pub use collision::{StepOutcome, step_player};
pub use food::{flee_step, move_foods};
pub use grid::{Direction, Grid};
pub use state::{
    Bomb, DeathReason, EntityId, ExplosionCell, Food, FoodKind, GameEvent, GamePhase,
    HazardRegistry, Player, PowerupPickup, Projectile, Session, SlowdownPickup, SpawnSource,
    generate,
};
pub use tick::{KeyEvent, TickResult, tick};
