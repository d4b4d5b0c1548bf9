//! Idle/demo mode - the computer plays the game
//!
//! Greedy: head toward the nearest food, never step onto a stone (unless
//! powered up), the body, or a live explosion.

use glam::IVec2;

use super::grid::Direction;
use super::state::{GamePhase, Session};
use super::tick::KeyEvent;

/// Keys the demo player would press this tick
pub fn autopilot_keys(session: &Session, now: u64) -> Vec<KeyEvent> {
    match session.phase {
        GamePhase::Start => vec![KeyEvent::Other],
        GamePhase::LevelIntro | GamePhase::LevelComplete => vec![KeyEvent::Confirm],
        GamePhase::Playing => choose_direction(session, now)
            .filter(|dir| *dir != session.player.direction)
            .map(KeyEvent::Steer)
            .into_iter()
            .collect(),
        GamePhase::Victory | GamePhase::GameOver | GamePhase::Shop => Vec::new(),
    }
}

/// Safest direction that gets closest to a food
fn choose_direction(session: &Session, now: u64) -> Option<Direction> {
    let grid = &session.grid;
    let head = session.player.head();
    let target = nearest_food(session)?;

    let safe = |cell: IVec2| {
        (!session.is_stone(cell) || session.player.powered_up())
            && !session.player.occupies(cell)
            && !session
                .hazards
                .explosions
                .iter()
                .any(|e| e.pos == cell && e.expires_at > now)
    };

    Direction::ALL
        .into_iter()
        .filter(|dir| *dir != session.player.heading.opposite())
        .map(|dir| (dir, grid.step(head, dir, 1)))
        .filter(|(_, cell)| safe(*cell))
        .min_by_key(|(_, cell)| grid.toroidal_distance_sq(*cell, target))
        .map(|(dir, _)| dir)
}

fn nearest_food(session: &Session) -> Option<IVec2> {
    let head = session.player.head();
    session
        .foods
        .iter()
        .map(|f| f.pos)
        .min_by_key(|pos| session.grid.toroidal_distance_sq(*pos, head))
}
