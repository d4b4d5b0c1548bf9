//! Game state and core simulation types
//!
//! One explicit [`Session`] owns everything a run mutates. Engine steps take
//! it by `&mut`; nothing lives in globals.

use std::collections::VecDeque;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Grid};
use crate::settings::Settings;

/// Stable id for foods and hazards
pub type EntityId = u32;

/// High-level mode of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for any key
    Start,
    /// Level banner, waiting for confirm
    LevelIntro,
    /// Simulation running
    Playing,
    /// All foods of a non-final level eaten
    LevelComplete,
    /// Final level cleared
    Victory,
    /// Player died; score already banked into coins
    GameOver,
    /// Spend coins on next-run upgrades
    Shop,
}

/// Why the last run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    CrashedIntoStone,
    CollidedWithSelf,
    CaughtInExplosion,
}

impl DeathReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathReason::CrashedIntoStone => "crashed into stone block",
            DeathReason::CollidedWithSelf => "collided with self",
            DeathReason::CaughtInExplosion => "caught in an explosion",
        }
    }
}

/// Which hazards a food emits while roaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    /// Emits both bombs and slowdowns
    Plain,
    /// Emits bombs only
    Bomb,
    /// Emits slowdowns only
    Slowdown,
}

impl FoodKind {
    /// Kind for the `index`-th food of a level
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => FoodKind::Plain,
            1 => FoodKind::Bomb,
            _ => FoodKind::Slowdown,
        }
    }

    pub fn emits_bombs(self) -> bool {
        matches!(self, FoodKind::Plain | FoodKind::Bomb)
    }

    pub fn emits_slowdowns(self) -> bool {
        matches!(self, FoodKind::Plain | FoodKind::Slowdown)
    }
}

/// How a bomb came to exist; selects its radius rule
///
/// The two rules disagree (age-scaled vs fixed). Both are kept on purpose
/// until product decides whether that is intended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnSource {
    /// Dropped by a food while it roams: radius grows with food age
    Roaming,
    /// Dropped when a food is eaten: fixed radius
    Eaten,
}

impl SpawnSource {
    /// Blast radius for a bomb from this source
    pub fn bomb_radius(self, food_age_ms: u64, settings: &Settings) -> u32 {
        match self {
            SpawnSource::Roaming => {
                let age = food_age_ms.min(settings.food_max_age_ms);
                1 + (4 * age / settings.food_max_age_ms) as u32
            }
            SpawnSource::Eaten => settings.eaten_bomb_radius,
        }
    }
}

/// A roaming food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: EntityId,
    pub kind: FoodKind,
    pub pos: IVec2,
    pub created_at: u64,
    pub last_move_at: u64,
    pub eaten_remaining: u32,
    /// Bombs this food spawned that may still be live (non-owning)
    pub bomb_ids: Vec<EntityId>,
    /// Slowdown pickups this food spawned that may still be live (non-owning)
    pub slowdown_ids: Vec<EntityId>,
}

impl Food {
    pub fn new(id: EntityId, kind: FoodKind, pos: IVec2, now: u64, bites: u32) -> Self {
        Self {
            id,
            kind,
            pos,
            created_at: now,
            last_move_at: now,
            eaten_remaining: bites,
            bomb_ids: Vec::new(),
            slowdown_ids: Vec::new(),
        }
    }

    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Move to a fresh cell after a bite, resetting age and bomb refs
    pub fn relocate(&mut self, pos: IVec2, now: u64) {
        self.pos = pos;
        self.created_at = now;
        self.last_move_at = now;
        self.bomb_ids.clear();
    }

    /// Drop references to hazards the registry no longer holds
    pub fn prune_refs(&mut self, hazards: &HazardRegistry) {
        self.bomb_ids.retain(|id| hazards.bombs.iter().any(|b| b.id == *id));
        self.slowdown_ids
            .retain(|id| hazards.slowdowns.iter().any(|s| s.id == *id));
    }
}

/// A live bomb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub id: EntityId,
    pub pos: IVec2,
    pub created_at: u64,
    pub radius: u32,
    pub source: SpawnSource,
}

impl Bomb {
    /// Absolute time the fuse runs out
    pub fn detonates_at(&self, fuse_ms: u64) -> u64 {
        self.created_at + fuse_ms
    }
}

/// One cell of a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionCell {
    pub pos: IVec2,
    pub expires_at: u64,
}

/// A slowdown pickup lying on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowdownPickup {
    pub id: EntityId,
    pub pos: IVec2,
    pub created_at: u64,
}

/// A powerup pickup lying on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupPickup {
    pub id: EntityId,
    pub pos: IVec2,
    pub created_at: u64,
}

/// A shot fired while powered up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: IVec2,
    pub dir: Direction,
    pub spawned_at: u64,
}

/// Single authoritative store of every active hazard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HazardRegistry {
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<ExplosionCell>,
    pub slowdowns: Vec<SlowdownPickup>,
    pub powerups: Vec<PowerupPickup>,
    pub projectiles: Vec<Projectile>,
}

impl HazardRegistry {
    pub fn clear(&mut self) {
        self.bombs.clear();
        self.explosions.clear();
        self.slowdowns.clear();
        self.powerups.clear();
        self.projectiles.clear();
    }

    pub fn bomb_at(&self, pos: IVec2) -> bool {
        self.bombs.iter().any(|b| b.pos == pos)
    }

    pub fn slowdown_at(&self, pos: IVec2) -> bool {
        self.slowdowns.iter().any(|s| s.pos == pos)
    }

    pub fn powerup_at(&self, pos: IVec2) -> bool {
        self.powerups.iter().any(|p| p.pos == pos)
    }

    /// Cells of bombs and pickups (things food may not walk onto)
    pub fn occupied_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.bombs
            .iter()
            .map(|b| b.pos)
            .chain(self.slowdowns.iter().map(|s| s.pos))
            .chain(self.powerups.iter().map(|p| p.pos))
    }
}

/// The player's snake and the buffs it carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Occupied cells, head first
    pub body: VecDeque<IVec2>,
    /// Direction applied on the next move
    pub direction: Direction,
    /// Direction of the last committed move (reversal guard)
    pub heading: Direction,
    /// Shield charges
    pub shields: u32,
    /// Expiry times of active slowdown buffs
    pub slowdown_buffs: Vec<u64>,
    /// Expiry times of active powerup buffs
    pub powerup_buffs: Vec<u64>,
}

impl Player {
    /// Three cells long at `head`, facing right
    pub fn new(grid: &Grid, head: IVec2, shields: u32) -> Self {
        let body = (0..3)
            .map(|i| grid.step(head, Direction::Left, i))
            .collect();
        Self {
            body,
            direction: Direction::Right,
            heading: Direction::Right,
            shields,
            slowdown_buffs: Vec::new(),
            powerup_buffs: Vec::new(),
        }
    }

    pub fn head(&self) -> IVec2 {
        self.body[0]
    }

    pub fn occupies(&self, cell: IVec2) -> bool {
        self.body.contains(&cell)
    }

    pub fn powered_up(&self) -> bool {
        !self.powerup_buffs.is_empty()
    }

    /// Queue a turn; reversing onto the neck is ignored
    pub fn steer(&mut self, dir: Direction) {
        if dir != self.heading.opposite() {
            self.direction = dir;
        }
    }
}

/// Everything that happened during one tick, for logs and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    LevelStarted { level: u32, foods: usize },
    BombSpawned { id: EntityId, pos: IVec2, radius: u32, source: SpawnSource },
    BombDefused { id: EntityId, pos: IVec2 },
    BombDetonated { id: EntityId, pos: IVec2, cells: usize },
    SlowdownSpawned { id: EntityId, pos: IVec2 },
    SlowdownCollected { id: EntityId },
    PowerupSpawned { id: EntityId, pos: IVec2 },
    PowerupCollected { id: EntityId },
    ProjectileFired { id: EntityId },
    StoneDestroyed { pos: IVec2 },
    ShieldUsed { remaining: u32 },
    FoodEaten { id: EntityId, remaining: u32 },
    FoodRemoved { id: EntityId },
    Died { reason: DeathReason },
    ShieldPurchased { coins_left: u64 },
}

/// Complete state of one game session
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub grid: Grid,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    /// Banked score, survives resets
    pub coins: u64,
    /// Shields bought in the shop for the next run
    pub next_run_shields: u32,
    pub death_reason: Option<DeathReason>,
    pub player: Player,
    pub foods: Vec<Food>,
    pub stones: Vec<IVec2>,
    pub hazards: HazardRegistry,
    /// Ticks per second given current slowdowns
    pub current_speed: u32,
    next_id: EntityId,
}

impl Session {
    /// Create a session on the start screen
    pub fn new(settings: Settings) -> Self {
        let grid = Grid::new(settings.grid_width, settings.grid_height);
        let rng = Pcg32::seed_from_u64(settings.seed);
        let current_speed = settings.base_speed;
        let player = Player::new(&grid, grid.center(), 0);
        Self {
            settings,
            grid,
            rng,
            phase: GamePhase::Start,
            level: 1,
            score: 0,
            coins: 0,
            next_run_shields: 0,
            death_reason: None,
            player,
            foods: Vec::new(),
            stones: Vec::new(),
            hazards: HazardRegistry::default(),
            current_speed,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set_phase(&mut self, phase: GamePhase, events: &mut Vec<GameEvent>) {
        if self.phase != phase {
            log::info!("Phase {:?} -> {:?}", self.phase, phase);
            events.push(GameEvent::PhaseChanged {
                from: self.phase,
                to: phase,
            });
            self.phase = phase;
        }
    }

    /// Start a fresh run at level 1, carrying coins and bought shields
    pub fn reset_game(&mut self, now: u64, events: &mut Vec<GameEvent>) {
        self.level = 1;
        self.score = 0;
        self.death_reason = None;
        let shields = std::mem::take(&mut self.next_run_shields);
        self.setup_level(now, events);
        self.player.shields = shields;
        self.set_phase(GamePhase::Start, events);
    }

    /// Lay out the current level: player, stones, foods; clears all hazards
    pub fn setup_level(&mut self, now: u64, events: &mut Vec<GameEvent>) {
        let shields = self.player.shields;
        self.player = Player::new(&self.grid, self.grid.center(), shields);
        self.foods.clear();
        self.stones.clear();
        self.hazards.clear();
        self.current_speed = self.settings.base_speed;

        let num_foods = match self.level {
            1 => 1,
            2 => 3,
            _ => 5,
        };
        if self.level >= 3 {
            let (w, h) = (self.grid.width, self.grid.height);
            for x in 5..(w - 5).max(5) {
                self.stones.push(IVec2::new(x, h / 3));
                self.stones.push(IVec2::new(x, h / 3 * 2));
            }
        }

        for i in 0..num_foods {
            let Some(pos) = self.free_cell() else {
                log::warn!("No free cell for food {} on level {}", i, self.level);
                break;
            };
            let id = self.next_entity_id();
            let food = Food::new(id, FoodKind::for_index(i), pos, now, self.settings.food_bites);
            self.foods.push(food);
        }

        log::info!(
            "Level {}: {} foods, {} stones",
            self.level,
            self.foods.len(),
            self.stones.len()
        );
        events.push(GameEvent::LevelStarted {
            level: self.level,
            foods: self.foods.len(),
        });
    }

    /// Every cell a newly spawned entity must avoid
    pub fn occupied_cells(&self) -> Vec<IVec2> {
        self.foods
            .iter()
            .map(|f| f.pos)
            .chain(self.stones.iter().copied())
            .chain(self.player.body.iter().copied())
            .chain(self.hazards.occupied_cells())
            .collect()
    }

    /// Random cell not occupied by anything
    pub fn free_cell(&mut self) -> Option<IVec2> {
        let occupied = self.occupied_cells();
        generate(&mut self.rng, &self.grid, &occupied)
    }

    pub fn is_stone(&self, cell: IVec2) -> bool {
        self.stones.contains(&cell)
    }

    /// Remove a stone if present; returns whether one was there
    pub fn remove_stone(&mut self, cell: IVec2) -> bool {
        if let Some(i) = self.stones.iter().position(|s| *s == cell) {
            self.stones.swap_remove(i);
            true
        } else {
            false
        }
    }

    /// End the run: record the reason and bank the score into coins
    pub fn die(&mut self, reason: DeathReason, events: &mut Vec<GameEvent>) {
        log::info!("Died: {} (score {})", reason.as_str(), self.score);
        self.death_reason = Some(reason);
        self.coins += self.score;
        events.push(GameEvent::Died { reason });
        // Blast deaths skip the game-over screen
        let next = match reason {
            DeathReason::CaughtInExplosion => GamePhase::Shop,
            _ => GamePhase::GameOver,
        };
        self.set_phase(next, events);
    }

    /// Whether the current level is the last one
    pub fn on_final_level(&self) -> bool {
        self.level >= self.settings.max_level
    }
}

/// Pick a random cell outside `existing`
///
/// Tries random cells first, then scans the grid so a nearly full board
/// still terminates. Returns `None` only when every cell is taken.
pub fn generate(rng: &mut Pcg32, grid: &Grid, existing: &[IVec2]) -> Option<IVec2> {
    let cells = grid.cell_count();
    for _ in 0..cells.max(16) {
        let cell = IVec2::new(
            rng.random_range(0..grid.width),
            rng.random_range(0..grid.height),
        );
        if !existing.contains(&cell) {
            return Some(cell);
        }
    }
    (0..cells)
        .map(|i| grid.cell_at(i))
        .find(|cell| !existing.contains(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_session_on_start_screen() {
        let session = Session::new(Settings::default());
        assert_eq!(session.phase, GamePhase::Start);
        assert_eq!(session.level, 1);
        assert_eq!(session.player.body.len(), 3);
        assert_eq!(session.player.head(), session.grid.center());
    }

    #[test]
    fn test_setup_level_food_counts() {
        let mut session = Session::new(Settings::default());
        let mut events = Vec::new();
        for (level, foods) in [(1, 1), (2, 3), (3, 5)] {
            session.level = level;
            session.setup_level(0, &mut events);
            assert_eq!(session.foods.len(), foods);
        }
        // Level 3 has two stone walls
        assert_eq!(session.stones.len(), 2 * (session.grid.width as usize - 10));
    }

    #[test]
    fn test_foods_never_spawn_on_occupied_cells() {
        let mut session = Session::new(Settings::default());
        session.level = 3;
        session.setup_level(0, &mut Vec::new());
        for (i, food) in session.foods.iter().enumerate() {
            assert!(!session.is_stone(food.pos));
            assert!(!session.player.occupies(food.pos));
            assert!(session.foods[i + 1..].iter().all(|f| f.pos != food.pos));
        }
    }

    #[test]
    fn test_reset_game_applies_bought_shields() {
        let mut session = Session::new(Settings::default());
        session.next_run_shields = 2;
        session.coins = 7;
        session.reset_game(0, &mut Vec::new());
        assert_eq!(session.player.shields, 2);
        assert_eq!(session.next_run_shields, 0);
        assert_eq!(session.coins, 7);
    }

    #[test]
    fn test_die_banks_score() {
        let mut session = Session::new(Settings::default());
        session.phase = GamePhase::Playing;
        session.score = 12;
        session.coins = 3;
        let mut events = Vec::new();
        session.die(DeathReason::CrashedIntoStone, &mut events);
        assert_eq!(session.coins, 15);
        assert_eq!(session.phase, GamePhase::GameOver);
        assert!(events.contains(&GameEvent::Died {
            reason: DeathReason::CrashedIntoStone
        }));
    }

    #[test]
    fn test_explosion_death_opens_shop() {
        let mut session = Session::new(Settings::default());
        session.phase = GamePhase::Playing;
        session.score = 6;
        let mut events = Vec::new();
        session.die(DeathReason::CaughtInExplosion, &mut events);
        assert_eq!(session.coins, 6);
        assert_eq!(session.phase, GamePhase::Shop);
        assert!(events.contains(&GameEvent::PhaseChanged {
            from: GamePhase::Playing,
            to: GamePhase::Shop
        }));
    }

    #[test]
    fn test_roaming_radius_scales_with_age() {
        let settings = Settings::default();
        let max = settings.food_max_age_ms;
        assert_eq!(SpawnSource::Roaming.bomb_radius(0, &settings), 1);
        assert_eq!(SpawnSource::Roaming.bomb_radius(max / 2, &settings), 3);
        assert_eq!(SpawnSource::Roaming.bomb_radius(max, &settings), 5);
        assert_eq!(SpawnSource::Roaming.bomb_radius(max * 10, &settings), 5);
        assert_eq!(
            SpawnSource::Eaten.bomb_radius(0, &settings),
            settings.eaten_bomb_radius
        );
    }

    #[test]
    fn test_steer_ignores_reversal() {
        let grid = Grid::new(10, 10);
        let mut player = Player::new(&grid, grid.center(), 0);
        player.steer(Direction::Left);
        assert_eq!(player.direction, Direction::Right);
        player.steer(Direction::Up);
        assert_eq!(player.direction, Direction::Up);
    }

    #[test]
    fn test_generate_finds_last_free_cell() {
        let grid = Grid::new(3, 3);
        let mut rng = Pcg32::seed_from_u64(1);
        let existing: Vec<IVec2> = (0..9).map(|i| grid.cell_at(i)).filter(|c| *c != IVec2::new(2, 1)).collect();
        assert_eq!(generate(&mut rng, &grid, &existing), Some(IVec2::new(2, 1)));
        let full: Vec<IVec2> = (0..9).map(|i| grid.cell_at(i)).collect();
        assert_eq!(generate(&mut rng, &grid, &full), None);
    }

    proptest! {
        #[test]
        fn prop_generate_is_disjoint_from_existing(
            seed in any::<u64>(),
            taken in proptest::collection::vec((0i32..8, 0i32..6), 0..40)
        ) {
            let grid = Grid::new(8, 6);
            let existing: Vec<IVec2> = taken.into_iter().map(|(x, y)| IVec2::new(x, y)).collect();
            let mut rng = Pcg32::seed_from_u64(seed);
            if let Some(cell) = generate(&mut rng, &grid, &existing) {
                prop_assert!(!existing.contains(&cell));
                prop_assert!(cell.x >= 0 && cell.x < 8 && cell.y >= 0 && cell.y < 6);
            } else {
                prop_assert!((0..grid.cell_count()).all(|i| existing.contains(&grid.cell_at(i))));
            }
        }
    }
}
