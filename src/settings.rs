//! Game settings and balance
//!
//! Loaded from a JSON file on native; every field has a default so partial
//! files are accepted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Game settings/balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Grid ===
    pub grid_width: i32,
    pub grid_height: i32,
    /// Pixel size of a cell (presentation only)
    pub cell_size: i32,

    // === Pacing ===
    /// Ticks per second with no slowdown active
    pub base_speed: u32,
    /// Slowdown buffs counted toward the speed divisor
    pub max_slowdown_stack: usize,

    // === Durations (ms) ===
    pub bomb_duration_ms: u64,
    pub explosion_duration_ms: u64,
    pub food_move_interval_ms: u64,
    pub food_max_age_ms: u64,
    pub slowdown_pickup_lifetime_ms: u64,
    pub slow_duration_ms: u64,
    pub powerup_on_map_ms: u64,
    pub powerup_effect_ms: u64,
    pub projectile_lifetime_ms: u64,

    // === Spawn chances ===
    /// Per-tick chance a food considers emitting hazards at all
    pub hazard_roll_chance: f64,
    /// Chance of a bomb once the hazard roll passes
    pub bomb_chance: f64,
    /// Chance of a slowdown once the hazard roll passes
    pub slowdown_chance: f64,
    /// Chance that an eaten food drops a bomb or slowdown
    pub eat_reward_chance: f64,
    /// Per-tick chance of a powerup appearing on the map
    pub powerup_spawn_chance: f64,

    // === Caps ===
    pub bombs_per_food: usize,
    pub slowdowns_per_food: usize,
    pub powerups_on_map: usize,

    // === Scoring / progression ===
    pub defuse_bonus: u64,
    pub food_bites: u32,
    pub eaten_bomb_radius: u32,
    pub max_level: u32,
    pub shield_cost: u64,

    /// RNG seed for a run
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            cell_size: CELL_SIZE,

            base_speed: BASE_SPEED,
            max_slowdown_stack: MAX_SLOWDOWN_STACK,

            bomb_duration_ms: BOMB_DURATION_MS,
            explosion_duration_ms: EXPLOSION_DURATION_MS,
            food_move_interval_ms: FOOD_MOVE_INTERVAL_MS,
            food_max_age_ms: FOOD_MAX_AGE_MS,
            slowdown_pickup_lifetime_ms: SLOWDOWN_PICKUP_LIFETIME_MS,
            slow_duration_ms: SLOW_DURATION_MS,
            powerup_on_map_ms: POWERUP_DURATION_ON_MAP_MS,
            powerup_effect_ms: POWERUP_EFFECT_DURATION_MS,
            projectile_lifetime_ms: PROJECTILE_LIFETIME_MS,

            hazard_roll_chance: 0.3,
            bomb_chance: 0.66,
            slowdown_chance: 0.3,
            eat_reward_chance: 0.3,
            powerup_spawn_chance: 0.002,

            bombs_per_food: 1,
            slowdowns_per_food: 2,
            powerups_on_map: 1,

            defuse_bonus: DEFUSE_BONUS,
            food_bites: FOOD_BITES,
            eaten_bomb_radius: EATEN_BOMB_RADIUS,
            max_level: MAX_LEVEL,
            shield_cost: SHIELD_COST,

            seed: 0x5EED_CAFE,
        }
    }
}

impl Settings {
    /// Env var naming a settings file
    const ENV_PATH: &'static str = "SNAKELITE_SETTINGS";
    /// Settings file looked up in the working directory
    const DEFAULT_PATH: &'static str = "snakelite.json";

    /// Defaults with every random spawn disabled, for scripted runs
    pub fn without_random_spawns() -> Self {
        Self {
            hazard_roll_chance: 0.0,
            eat_reward_chance: 0.0,
            powerup_spawn_chance: 0.0,
            ..Self::default()
        }
    }

    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings from `$SNAKELITE_SETTINGS` or `snakelite.json`, falling
    /// back to defaults when neither is usable
    pub fn load() -> Self {
        let path = std::env::var_os(Self::ENV_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_PATH));

        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(SettingsError::Invalid {
                field: "grid_width/grid_height",
                reason: "must be positive",
            });
        }
        if self.cell_size <= 0 {
            return Err(SettingsError::Invalid {
                field: "cell_size",
                reason: "must be positive",
            });
        }
        if self.base_speed == 0 {
            return Err(SettingsError::Invalid {
                field: "base_speed",
                reason: "must be at least 1",
            });
        }
        let chances = [
            ("hazard_roll_chance", self.hazard_roll_chance),
            ("bomb_chance", self.bomb_chance),
            ("slowdown_chance", self.slowdown_chance),
            ("eat_reward_chance", self.eat_reward_chance),
            ("powerup_spawn_chance", self.powerup_spawn_chance),
        ];
        for (field, p) in chances {
            if !(0.0..=1.0).contains(&p) {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "probability must be within [0, 1]",
                });
            }
        }
        if self.max_level == 0 {
            return Err(SettingsError::Invalid {
                field: "max_level",
                reason: "must be at least 1",
            });
        }
        if self.food_bites == 0 {
            return Err(SettingsError::Invalid {
                field: "food_bites",
                reason: "must be at least 1",
            });
        }
        if self.food_max_age_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "food_max_age_ms",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Ticks per second for a given number of active slowdown buffs
    ///
    /// `base / (1 + 2 * min(n, cap))`, never below one tick per second.
    pub fn effective_speed(&self, active_slowdowns: usize) -> u32 {
        let stacks = active_slowdowns.min(self.max_slowdown_stack) as u32;
        (self.base_speed / (1 + 2 * stacks)).max(1)
    }
}
