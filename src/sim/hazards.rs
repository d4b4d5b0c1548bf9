//! Hazard lifecycle: bombs, explosions, slowdowns, powerups, projectiles
//!
//! Each step advances one hazard collection in the session's registry.
//! `tick` calls them in a fixed order.

use rand::Rng;

use super::state::{
    DeathReason, ExplosionCell, GameEvent, Projectile, PowerupPickup, Session,
};

/// Detonate every bomb whose fuse has run out
///
/// A detonated bomb leaves a stone on its cell and a cross of explosion
/// cells that all expire `explosion_duration_ms` after `now`.
pub fn advance_bombs(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let fuse = session.settings.bomb_duration_ms;
    let expires_at = now + session.settings.explosion_duration_ms;

    let (live, due): (Vec<_>, Vec<_>) = std::mem::take(&mut session.hazards.bombs)
        .into_iter()
        .partition(|b| now.saturating_sub(b.created_at) < fuse);
    session.hazards.bombs = live;

    for bomb in due {
        if !session.is_stone(bomb.pos) {
            session.stones.push(bomb.pos);
        }
        let pattern = session.grid.blast_pattern(bomb.pos, bomb.radius);
        let cells = pattern.len();
        session
            .hazards
            .explosions
            .extend(pattern.into_iter().map(|pos| ExplosionCell { pos, expires_at }));
        log::debug!("Bomb {} detonated at {} ({} cells)", bomb.id, bomb.pos, cells);
        events.push(GameEvent::BombDetonated {
            id: bomb.id,
            pos: bomb.pos,
            cells,
        });
    }
}

/// Defuse a live bomb sitting under the player's head
pub fn check_bomb_collision(session: &mut Session, events: &mut Vec<GameEvent>) {
    let head = session.player.head();
    if let Some(i) = session.hazards.bombs.iter().position(|b| b.pos == head) {
        let bomb = session.hazards.bombs.remove(i);
        session.score += session.settings.defuse_bonus;
        log::debug!("Bomb {} defused at {}", bomb.id, bomb.pos);
        events.push(GameEvent::BombDefused {
            id: bomb.id,
            pos: bomb.pos,
        });
    }
}

/// Kill the player if the head is inside a live explosion
///
/// Any shield charge or active powerup grants immunity. Neither is spent.
pub fn check_explosion_collision(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let head = session.player.head();
    let hit = session
        .hazards
        .explosions
        .iter()
        .any(|e| e.expires_at > now && e.pos == head);
    if !hit {
        return;
    }
    // TODO: confirm with design whether surviving a blast should spend a shield
    if session.player.shields == 0 && !session.player.powered_up() {
        session.die(DeathReason::CaughtInExplosion, events);
    }
}

/// Drop explosion cells that have burned out
pub fn advance_explosions(session: &mut Session, now: u64) {
    session.hazards.explosions.retain(|e| e.expires_at > now);
}

/// Expire slowdown pickups and buffs, then recompute the tick rate
pub fn advance_slowdowns(session: &mut Session, now: u64) {
    let lifetime = session.settings.slowdown_pickup_lifetime_ms;
    session
        .hazards
        .slowdowns
        .retain(|s| now.saturating_sub(s.created_at) < lifetime);
    session.player.slowdown_buffs.retain(|&t| t > now);
    session.current_speed = session
        .settings
        .effective_speed(session.player.slowdown_buffs.len());
}

/// Expire powerup pickups and buffs, and occasionally place a new pickup
pub fn advance_powerups(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let lifetime = session.settings.powerup_on_map_ms;
    session
        .hazards
        .powerups
        .retain(|p| now.saturating_sub(p.created_at) < lifetime);
    session.player.powerup_buffs.retain(|&t| t > now);

    if session.hazards.powerups.len() < session.settings.powerups_on_map
        && session.rng.random_bool(session.settings.powerup_spawn_chance)
    {
        let Some(pos) = session.free_cell() else {
            log::warn!("No free cell for a powerup");
            return;
        };
        let id = session.next_entity_id();
        session.hazards.powerups.push(PowerupPickup {
            id,
            pos,
            created_at: now,
        });
        log::debug!("Powerup {} at {}", id, pos);
        events.push(GameEvent::PowerupSpawned { id, pos });
    }
}

/// Fire a projectile from the head if a powerup buff is active
pub fn fire_projectile(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) -> bool {
    if !session.player.powered_up() {
        return false;
    }
    let id = session.next_entity_id();
    session.hazards.projectiles.push(Projectile {
        id,
        pos: session.player.head(),
        dir: session.player.direction,
        spawned_at: now,
    });
    events.push(GameEvent::ProjectileFired { id });
    true
}

/// Move projectiles one cell; a projectile that reaches a stone destroys it
pub fn advance_projectiles(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let lifetime = session.settings.projectile_lifetime_ms;
    let projectiles = std::mem::take(&mut session.hazards.projectiles);

    for mut shot in projectiles {
        if now.saturating_sub(shot.spawned_at) > lifetime {
            continue;
        }
        shot.pos = session.grid.step(shot.pos, shot.dir, 1);
        if session.remove_stone(shot.pos) {
            session.score += 1;
            events.push(GameEvent::StoneDestroyed { pos: shot.pos });
            continue;
        }
        session.hazards.projectiles.push(shot);
    }
}
