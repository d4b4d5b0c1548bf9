//! Player step resolution
//!
//! Moves the snake one cell and resolves what the new head runs into, in
//! this order: stone, own body, food, pickups, level completion.

use super::food::spawn_eat_reward;
use super::state::{DeathReason, GameEvent, GamePhase, Session, generate};

/// What the player's move did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Head advanced, tail dropped
    Moved,
    /// Head advanced onto food, tail kept
    Grew,
    /// A shield absorbed a self-collision; nothing moved
    Bumped,
    /// The run ended
    Died(DeathReason),
}

/// Advance the player by one cell
pub fn step_player(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) -> StepOutcome {
    let new_head = session
        .grid
        .step(session.player.head(), session.player.direction, 1);

    // Stone: powerup smashes through, else a shield does, else death
    if session.is_stone(new_head) {
        if session.player.powered_up() {
            session.remove_stone(new_head);
            session.score += 1;
            events.push(GameEvent::StoneDestroyed { pos: new_head });
        } else if session.player.shields > 0 {
            session.player.shields -= 1;
            session.remove_stone(new_head);
            session.score += 1;
            events.push(GameEvent::ShieldUsed {
                remaining: session.player.shields,
            });
            events.push(GameEvent::StoneDestroyed { pos: new_head });
        } else {
            session.die(DeathReason::CrashedIntoStone, events);
            return StepOutcome::Died(DeathReason::CrashedIntoStone);
        }
    }

    // Own body: a shield turns the move into a no-op
    if session.player.occupies(new_head) {
        if session.player.shields > 0 {
            session.player.shields -= 1;
            events.push(GameEvent::ShieldUsed {
                remaining: session.player.shields,
            });
            return StepOutcome::Bumped;
        }
        session.die(DeathReason::CollidedWithSelf, events);
        return StepOutcome::Died(DeathReason::CollidedWithSelf);
    }

    session.player.body.push_front(new_head);
    session.player.heading = session.player.direction;

    let ate = eat_food_at_head(session, now, events);
    if !ate {
        session.player.body.pop_back();
    }

    collect_pickups(session, now, events);

    if ate && session.foods.is_empty() {
        let next = if session.on_final_level() {
            GamePhase::Victory
        } else {
            GamePhase::LevelComplete
        };
        session.set_phase(next, events);
    }

    if ate { StepOutcome::Grew } else { StepOutcome::Moved }
}

/// Take a bite of the food under the head, if any
fn eat_food_at_head(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) -> bool {
    let head = session.player.head();
    let Some(i) = session.foods.iter().position(|f| f.pos == head) else {
        return false;
    };

    session.score += 1;
    let food = &mut session.foods[i];
    food.eaten_remaining = food.eaten_remaining.saturating_sub(1);
    let (id, remaining) = (food.id, food.eaten_remaining);
    events.push(GameEvent::FoodEaten { id, remaining });

    if remaining > 0 {
        // The food's own cell is the head, so it stays excluded
        let occupied = session.occupied_cells();
        match generate(&mut session.rng, &session.grid, &occupied) {
            Some(pos) => session.foods[i].relocate(pos, now),
            None => log::warn!("No free cell to relocate food {}", id),
        }
        spawn_eat_reward(session, i, now, events);
    } else {
        // The reward lands on the cell the food was eaten on
        spawn_eat_reward(session, i, now, events);
        session.foods.remove(i);
        log::info!("Food {} finished ({} left)", id, session.foods.len());
        events.push(GameEvent::FoodRemoved { id });
    }
    true
}

/// Collect a slowdown or powerup pickup under the head
fn collect_pickups(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let head = session.player.head();

    if let Some(i) = session.hazards.slowdowns.iter().position(|s| s.pos == head) {
        let pickup = session.hazards.slowdowns.remove(i);
        session
            .player
            .slowdown_buffs
            .push(now + session.settings.slow_duration_ms);
        events.push(GameEvent::SlowdownCollected { id: pickup.id });
    }

    if let Some(i) = session.hazards.powerups.iter().position(|p| p.pos == head) {
        let pickup = session.hazards.powerups.remove(i);
        session
            .player
            .powerup_buffs
            .push(now + session.settings.powerup_effect_ms);
        log::info!("Powered up until {}", now + session.settings.powerup_effect_ms);
        events.push(GameEvent::PowerupCollected { id: pickup.id });
    }
}
