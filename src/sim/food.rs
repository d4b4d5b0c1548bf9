//! Food movement and hazard emission
//!
//! Foods flee the player's head one cell at a time and drop bombs and
//! slowdown pickups onto the cell they occupy.

use glam::IVec2;
use rand::Rng;

use super::grid::{Direction, Grid};
use super::state::{Bomb, EntityId, FoodKind, GameEvent, Session, SlowdownPickup, SpawnSource};

/// Pick the step that takes `pos` farthest from `head`
///
/// Distance is [`Grid::forward_distance_sq`] from the head. Candidates are
/// tried in `Direction::ALL` order and the first maximal one wins; the food
/// always moves if it can, even when every option is closer. Returns `None`
/// when every neighbour is blocked.
pub fn flee_step(
    grid: &Grid,
    pos: IVec2,
    head: IVec2,
    blocked: impl Fn(IVec2) -> bool,
) -> Option<IVec2> {
    let mut best: Option<(IVec2, i64)> = None;
    for dir in Direction::ALL {
        let cell = grid.step(pos, dir, 1);
        if blocked(cell) {
            continue;
        }
        let dist = grid.forward_distance_sq(cell, head);
        if best.is_none_or(|(_, d)| dist > d) {
            best = Some((cell, dist));
        }
    }
    best.map(|(cell, _)| cell)
}

/// Move every food that is due, then let it roll for new hazards
pub fn move_foods(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let head = session.player.head();
    let interval = session.settings.food_move_interval_ms;

    for i in 0..session.foods.len() {
        session.foods[i].prune_refs(&session.hazards);

        let food = &session.foods[i];
        if now.saturating_sub(food.last_move_at) >= interval {
            let target = {
                let s = &*session;
                flee_step(&s.grid, food.pos, head, |cell| {
                    s.is_stone(cell)
                        || s.hazards.bomb_at(cell)
                        || s.hazards.slowdown_at(cell)
                        || s.hazards.powerup_at(cell)
                        || s.foods.iter().enumerate().any(|(j, f)| j != i && f.pos == cell)
                })
            };
            if let Some(cell) = target {
                let food = &mut session.foods[i];
                food.pos = cell;
                food.last_move_at = now;
            }
        }

        emit_roaming_hazards(session, i, now, events);
    }
}

/// Roll for a bomb and/or slowdown at the food's cell
fn emit_roaming_hazards(session: &mut Session, index: usize, now: u64, events: &mut Vec<GameEvent>) {
    let settings = &session.settings;
    let (hazard_roll, bomb_chance, slow_chance) = (
        settings.hazard_roll_chance,
        settings.bomb_chance,
        settings.slowdown_chance,
    );
    let (bomb_cap, slow_cap) = (settings.bombs_per_food, settings.slowdowns_per_food);

    if !session.rng.random_bool(hazard_roll) {
        return;
    }

    let kind = session.foods[index].kind;
    if kind.emits_bombs()
        && session.rng.random_bool(bomb_chance)
        && session.foods[index].bomb_ids.len() < bomb_cap
    {
        spawn_bomb(session, index, SpawnSource::Roaming, now, events);
    }
    if kind.emits_slowdowns()
        && session.rng.random_bool(slow_chance)
        && session.foods[index].slowdown_ids.len() < slow_cap
    {
        spawn_slowdown(session, index, now, events);
    }
}

/// Drop a bomb or a slowdown where a just-eaten food now sits
///
/// Plain food picks one at random; the other kinds drop their own hazard.
/// Never both.
pub fn spawn_eat_reward(session: &mut Session, index: usize, now: u64, events: &mut Vec<GameEvent>) {
    if !session.rng.random_bool(session.settings.eat_reward_chance) {
        return;
    }
    let bomb = match session.foods[index].kind {
        FoodKind::Plain => session.rng.random_bool(0.5),
        FoodKind::Bomb => true,
        FoodKind::Slowdown => false,
    };
    if bomb {
        spawn_bomb(session, index, SpawnSource::Eaten, now, events);
    } else {
        spawn_slowdown(session, index, now, events);
    }
}

/// Register a bomb at the food's cell and link it back to the food
pub fn spawn_bomb(
    session: &mut Session,
    index: usize,
    source: SpawnSource,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> EntityId {
    let id = session.next_entity_id();
    let food = &session.foods[index];
    let radius = source.bomb_radius(food.age(now), &session.settings);
    let pos = food.pos;

    session.hazards.bombs.push(Bomb {
        id,
        pos,
        created_at: now,
        radius,
        source,
    });
    session.foods[index].bomb_ids.push(id);
    log::debug!("Bomb {} at {} (radius {}, {:?})", id, pos, radius, source);
    events.push(GameEvent::BombSpawned {
        id,
        pos,
        radius,
        source,
    });
    id
}

/// Register a slowdown pickup at the food's cell and link it back to the food
pub fn spawn_slowdown(
    session: &mut Session,
    index: usize,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> EntityId {
    let id = session.next_entity_id();
    let pos = session.foods[index].pos;
    session.hazards.slowdowns.push(SlowdownPickup {
        id,
        pos,
        created_at: now,
    });
    session.foods[index].slowdown_ids.push(id);
    log::debug!("Slowdown {} at {}", id, pos);
    events.push(GameEvent::SlowdownSpawned { id, pos });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{Food, GamePhase};

    fn quiet_session() -> Session {
        let mut session = Session::new(Settings {
            grid_width: 10,
            grid_height: 10,
            ..Settings::without_random_spawns()
        });
        session.phase = GamePhase::Playing;
        session.foods.clear();
        session
    }

    fn add_food(session: &mut Session, pos: IVec2, kind: FoodKind) -> usize {
        let id = session.next_entity_id();
        session.foods.push(Food::new(id, kind, pos, 0, 5));
        session.foods.len() - 1
    }

    #[test]
    fn test_flee_picks_farthest() {
        let grid = Grid::new(10, 10);
        // Head left of food: Up wraps to dy = 9 (82) and beats Right (4)
        let step = flee_step(&grid, IVec2::new(5, 5), IVec2::new(4, 5), |_| false);
        assert_eq!(step, Some(IVec2::new(5, 4)));
    }

    #[test]
    fn test_flee_distance_is_one_sided() {
        let grid = Grid::new(10, 10);
        // Head right of food: Up scores 81 + 81; the short-way metric would pick Left
        let step = flee_step(&grid, IVec2::new(5, 5), IVec2::new(6, 5), |_| false);
        assert_eq!(step, Some(IVec2::new(5, 4)));

        // With Up blocked, Down (81 + 1) beats Left (64)
        let up = IVec2::new(5, 4);
        let step = flee_step(&grid, IVec2::new(5, 5), IVec2::new(6, 5), |c| c == up);
        assert_eq!(step, Some(IVec2::new(5, 6)));
    }

    #[test]
    fn test_flee_moves_even_when_every_option_is_closer() {
        let grid = Grid::new(10, 10);
        // Only Right is open, and it lands on the head
        let right = IVec2::new(6, 5);
        let step = flee_step(&grid, IVec2::new(5, 5), right, |c| c != right);
        assert_eq!(step, Some(right));
    }

    #[test]
    fn test_flee_tie_prefers_enumeration_order() {
        let grid = Grid::new(10, 10);
        // Head on the food: Up and Left tie at 81, Up is tried first
        let step = flee_step(&grid, IVec2::new(5, 5), IVec2::new(5, 5), |_| false);
        assert_eq!(step, Some(IVec2::new(5, 4)));
    }

    #[test]
    fn test_flee_skips_blocked_and_stays_when_boxed_in() {
        let grid = Grid::new(10, 10);
        // Up is best but blocked; Right (4) beats Down (2) and Left (0)
        let up = IVec2::new(5, 4);
        let step = flee_step(&grid, IVec2::new(5, 5), IVec2::new(4, 5), |c| c == up);
        assert_eq!(step, Some(IVec2::new(6, 5)));
        assert_eq!(flee_step(&grid, IVec2::new(5, 5), IVec2::new(4, 5), |_| true), None);
    }

    #[test]
    fn test_food_waits_for_move_interval() {
        let mut session = quiet_session();
        let interval = session.settings.food_move_interval_ms;
        let idx = add_food(&mut session, IVec2::new(2, 2), FoodKind::Plain);
        let mut events = Vec::new();

        move_foods(&mut session, interval - 1, &mut events);
        assert_eq!(session.foods[idx].pos, IVec2::new(2, 2));

        move_foods(&mut session, interval, &mut events);
        assert_ne!(session.foods[idx].pos, IVec2::new(2, 2));
        assert_eq!(session.foods[idx].last_move_at, interval);
    }

    #[test]
    fn test_food_does_not_step_onto_stone_or_other_food() {
        let mut session = quiet_session();
        let pos = IVec2::new(2, 2);
        let idx = add_food(&mut session, pos, FoodKind::Plain);
        session.stones = vec![IVec2::new(2, 1), IVec2::new(2, 3), IVec2::new(1, 2)];
        add_food(&mut session, IVec2::new(3, 2), FoodKind::Plain);

        move_foods(&mut session, 10_000, &mut Vec::new());
        assert_eq!(session.foods[idx].pos, pos);
        assert_eq!(session.foods[idx].last_move_at, 0);
    }

    #[test]
    fn test_roaming_bomb_cap_and_registry_link() {
        let mut session = quiet_session();
        session.settings.hazard_roll_chance = 1.0;
        session.settings.bomb_chance = 1.0;
        session.settings.food_move_interval_ms = u64::MAX;
        let idx = add_food(&mut session, IVec2::new(2, 2), FoodKind::Bomb);
        let mut events = Vec::new();

        move_foods(&mut session, 100, &mut events);
        move_foods(&mut session, 200, &mut events);
        assert_eq!(session.hazards.bombs.len(), 1);
        assert_eq!(session.foods[idx].bomb_ids, vec![session.hazards.bombs[0].id]);
        // Bomb-only food never drops slowdowns
        assert!(session.hazards.slowdowns.is_empty());

        // Once the registry loses the bomb the food may drop another
        session.hazards.bombs.clear();
        move_foods(&mut session, 300, &mut events);
        assert_eq!(session.hazards.bombs.len(), 1);
        assert_eq!(session.foods[idx].bomb_ids.len(), 1);
    }

    #[test]
    fn test_slowdown_cap_per_food() {
        let mut session = quiet_session();
        session.settings.hazard_roll_chance = 1.0;
        session.settings.slowdown_chance = 1.0;
        session.settings.food_move_interval_ms = u64::MAX;
        add_food(&mut session, IVec2::new(2, 2), FoodKind::Slowdown);

        for t in 0..5 {
            move_foods(&mut session, t, &mut Vec::new());
        }
        assert_eq!(session.hazards.slowdowns.len(), session.settings.slowdowns_per_food);
        assert!(session.hazards.bombs.is_empty());
    }

    #[test]
    fn test_eaten_bomb_uses_fixed_radius() {
        let mut session = quiet_session();
        session.settings.eat_reward_chance = 1.0;
        let idx = add_food(&mut session, IVec2::new(4, 4), FoodKind::Bomb);
        let mut events = Vec::new();

        spawn_eat_reward(&mut session, idx, 0, &mut events);
        assert_eq!(session.hazards.bombs.len(), 1);
        assert_eq!(session.hazards.bombs[0].radius, session.settings.eaten_bomb_radius);
        assert_eq!(session.hazards.bombs[0].source, SpawnSource::Eaten);
        assert!(session.hazards.slowdowns.is_empty());
    }

    #[test]
    fn test_eat_reward_is_exclusive() {
        let mut session = quiet_session();
        session.settings.eat_reward_chance = 1.0;
        let idx = add_food(&mut session, IVec2::new(4, 4), FoodKind::Plain);
        for t in 0..20 {
            let before = session.hazards.bombs.len() + session.hazards.slowdowns.len();
            spawn_eat_reward(&mut session, idx, t, &mut Vec::new());
            let after = session.hazards.bombs.len() + session.hazards.slowdowns.len();
            assert_eq!(after, before + 1);
        }
    }
}
