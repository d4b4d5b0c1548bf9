//! Fixed tick and game state machine
//!
//! Applies the tick's key presses, then, while playing, runs the engine
//! steps in a fixed order.

use super::collision::step_player;
use super::food::move_foods;
use super::grid::Direction;
use super::hazards::{
    advance_bombs, advance_explosions, advance_powerups, advance_projectiles, advance_slowdowns,
    check_bomb_collision, check_explosion_collision, fire_projectile,
};
use super::state::{GameEvent, GamePhase, Session};

/// A discrete key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Quit,
    Steer(Direction),
    /// Space: continue / fire
    Confirm,
    /// R on the game over screen
    Restart,
    /// Numeric key in the shop
    ShopChoice(u8),
    /// Any other key (only meaningful on the start screen)
    Other,
}

/// Result of a tick
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// A quit key was pressed; the caller should exit
    pub quit: bool,
}

/// Advance the session by one tick at time `now` (ms)
pub fn tick(
    session: &mut Session,
    keys: impl IntoIterator<Item = KeyEvent>,
    now: u64,
) -> TickResult {
    let mut result = TickResult::default();

    for key in keys {
        if key == KeyEvent::Quit {
            log::info!("Quit requested");
            result.quit = true;
            return result;
        }
        handle_key(session, key, now, &mut result.events);
    }

    if session.phase == GamePhase::Playing {
        run_engine(session, now, &mut result.events);
    }

    result
}

/// Engine steps in order; stops as soon as the player is no longer playing
fn run_engine(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    advance_bombs(session, now, events);
    check_bomb_collision(session, events);
    check_explosion_collision(session, now, events);
    if session.phase != GamePhase::Playing {
        return;
    }
    advance_explosions(session, now);
    advance_slowdowns(session, now);
    advance_powerups(session, now, events);
    move_foods(session, now, events);
    advance_projectiles(session, now, events);
    step_player(session, now, events);
}

/// Apply one key press to the state machine
fn handle_key(session: &mut Session, key: KeyEvent, now: u64, events: &mut Vec<GameEvent>) {
    match (session.phase, key) {
        (GamePhase::Start, _) => {
            session.setup_level(now, events);
            session.set_phase(GamePhase::LevelIntro, events);
        }
        (GamePhase::LevelIntro, KeyEvent::Confirm) => {
            session.set_phase(GamePhase::Playing, events);
        }
        (GamePhase::Playing, KeyEvent::Steer(dir)) => session.player.steer(dir),
        (GamePhase::Playing, KeyEvent::Confirm) => {
            fire_projectile(session, now, events);
        }
        (GamePhase::LevelComplete, KeyEvent::Confirm) => {
            session.level += 1;
            if session.level <= session.settings.max_level {
                session.setup_level(now, events);
                session.set_phase(GamePhase::LevelIntro, events);
            } else {
                session.set_phase(GamePhase::Victory, events);
            }
        }
        (GamePhase::Victory, KeyEvent::Confirm) => session.reset_game(now, events),
        (GamePhase::GameOver, KeyEvent::Restart) => session.reset_game(now, events),
        (GamePhase::GameOver, KeyEvent::Confirm) => session.set_phase(GamePhase::Shop, events),
        (GamePhase::Shop, KeyEvent::ShopChoice(1)) => buy_shield(session, events),
        (GamePhase::Shop, KeyEvent::Confirm) => {
            session.reset_game(now, events);
            session.set_phase(GamePhase::LevelIntro, events);
        }
        _ => {}
    }
}

/// Spend coins on a shield for the next run
fn buy_shield(session: &mut Session, events: &mut Vec<GameEvent>) {
    let cost = session.settings.shield_cost;
    if session.coins >= cost {
        session.coins -= cost;
        session.next_run_shields += 1;
        log::info!(
            "Bought shield ({} queued, {} coins left)",
            session.next_run_shields,
            session.coins
        );
        events.push(GameEvent::ShieldPurchased {
            coins_left: session.coins,
        });
    }
}
