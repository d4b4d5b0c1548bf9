//! Snakelite - A grid snake arcade game with roaming food and timed hazards
//!
//! Core modules:
//! - `sim`: Deterministic simulation (hazards, collisions, game state machine)
//! - `renderer`: Read-only snapshots and a text renderer
//! - `platform`: Clock, frame pacing and input abstraction
//! - `settings`: Data-driven game balance

pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

/// Game configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Pixel size of one grid cell (presentation only)
    pub const CELL_SIZE: i32 = 20;

    /// Grid dimensions in cells (800x600 px at the default cell size)
    pub const GRID_WIDTH: i32 = 40;
    pub const GRID_HEIGHT: i32 = 30;

    /// Ticks per second with no slowdown active
    pub const BASE_SPEED: u32 = 10;
    /// Slowdown buffs beyond this count no longer slow the game further
    pub const MAX_SLOWDOWN_STACK: usize = 3;

    /// Bomb fuse before detonation (ms)
    pub const BOMB_DURATION_MS: u64 = 3000;
    /// Lifetime of explosion-affected cells (ms)
    pub const EXPLOSION_DURATION_MS: u64 = 500;
    /// Minimum time between food steps (ms)
    pub const FOOD_MOVE_INTERVAL_MS: u64 = 400;
    /// Food age at which roaming bombs reach full radius (ms)
    pub const FOOD_MAX_AGE_MS: u64 = 10_000;
    /// Uncollected slowdown pickups vanish after this (ms)
    pub const SLOWDOWN_PICKUP_LIFETIME_MS: u64 = 5000;
    /// Duration of a collected slowdown buff (ms)
    pub const SLOW_DURATION_MS: u64 = 5000;
    /// Uncollected powerups vanish after this (ms)
    pub const POWERUP_DURATION_ON_MAP_MS: u64 = 8000;
    /// Duration of a collected powerup buff (ms)
    pub const POWERUP_EFFECT_DURATION_MS: u64 = 10_000;
    /// Projectiles older than this are dropped (ms)
    pub const PROJECTILE_LIFETIME_MS: u64 = 1500;

    /// Score for stepping on a live bomb
    pub const DEFUSE_BONUS: u64 = 5;
    /// Bites needed to remove a food from the level
    pub const FOOD_BITES: u32 = 5;
    /// Radius of bombs dropped by eaten food
    pub const EATEN_BOMB_RADIUS: u32 = 3;
    /// Number of levels before victory
    pub const MAX_LEVEL: u32 = 3;
    /// Shop price of one shield charge (coins)
    pub const SHIELD_COST: u64 = 5;
}
