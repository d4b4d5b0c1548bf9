//! Presentation boundary
//!
//! The simulation hands out read-only [`Snapshot`]s; renderers consume them
//! and never feed anything back.

use std::io::{self, Write};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Direction, FoodKind, GamePhase, Session};

/// A food as presentation sees it, with the hazards it spawned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodView {
    pub pos: IVec2,
    pub kind: FoodKind,
    /// Age as a fraction of the max age (0-1), for colour ramps
    pub age_ratio: f32,
    pub eaten_remaining: u32,
    pub bombs: Vec<IVec2>,
    pub slowdowns: Vec<IVec2>,
}

/// A live bomb with its fuse progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BombView {
    pub pos: IVec2,
    pub radius: u32,
    /// Fuse left as a fraction (1 = fresh, 0 = about to blow)
    pub fuse_left: f32,
}

/// An explosion cell with its fade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionView {
    pub pos: IVec2,
    /// Remaining intensity (0-1)
    pub intensity: f32,
}

/// Read-only copy of everything a frame needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub now: u64,
    pub grid_width: i32,
    pub grid_height: i32,
    pub cell_size: i32,
    pub phase: GamePhase,
    pub body: Vec<IVec2>,
    pub direction: Direction,
    pub foods: Vec<FoodView>,
    pub stones: Vec<IVec2>,
    pub bombs: Vec<BombView>,
    pub slowdown_pickups: Vec<IVec2>,
    pub slowdown_buffs: Vec<u64>,
    pub powerup_pickups: Vec<IVec2>,
    pub powerup_buffs: Vec<u64>,
    pub projectiles: Vec<IVec2>,
    pub explosions: Vec<ExplosionView>,
    pub score: u64,
    pub level: u32,
    pub shields: u32,
    pub coins: u64,
    pub speed: u32,
    pub death_reason: String,
}

impl Snapshot {
    /// Copy the session state at time `now`
    pub fn capture(session: &Session, now: u64) -> Self {
        let settings = &session.settings;
        let hazards = &session.hazards;

        let foods = session
            .foods
            .iter()
            .map(|food| FoodView {
                pos: food.pos,
                kind: food.kind,
                age_ratio: (food.age(now) as f32 / settings.food_max_age_ms as f32).min(1.0),
                eaten_remaining: food.eaten_remaining,
                bombs: hazards
                    .bombs
                    .iter()
                    .filter(|b| food.bomb_ids.contains(&b.id))
                    .map(|b| b.pos)
                    .collect(),
                slowdowns: hazards
                    .slowdowns
                    .iter()
                    .filter(|s| food.slowdown_ids.contains(&s.id))
                    .map(|s| s.pos)
                    .collect(),
            })
            .collect();

        let fuse = settings.bomb_duration_ms.max(1) as f32;
        let bombs = hazards
            .bombs
            .iter()
            .map(|b| BombView {
                pos: b.pos,
                radius: b.radius,
                fuse_left: (b.detonates_at(settings.bomb_duration_ms).saturating_sub(now) as f32
                    / fuse)
                    .min(1.0),
            })
            .collect();

        let blast = settings.explosion_duration_ms.max(1) as f32;
        let explosions = hazards
            .explosions
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| ExplosionView {
                pos: e.pos,
                intensity: ((e.expires_at - now) as f32 / blast).min(1.0),
            })
            .collect();

        Self {
            now,
            grid_width: session.grid.width,
            grid_height: session.grid.height,
            cell_size: settings.cell_size,
            phase: session.phase,
            body: session.player.body.iter().copied().collect(),
            direction: session.player.direction,
            foods,
            stones: session.stones.clone(),
            bombs,
            slowdown_pickups: hazards.slowdowns.iter().map(|s| s.pos).collect(),
            slowdown_buffs: session.player.slowdown_buffs.clone(),
            powerup_pickups: hazards.powerups.iter().map(|p| p.pos).collect(),
            powerup_buffs: session.player.powerup_buffs.clone(),
            projectiles: hazards.projectiles.iter().map(|p| p.pos).collect(),
            explosions,
            score: session.score,
            level: session.level,
            shields: session.player.shields,
            coins: session.coins,
            speed: session.current_speed,
            death_reason: session
                .death_reason
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Anything that can present a snapshot
pub trait Renderer {
    fn present(&mut self, snapshot: &Snapshot) -> io::Result<()>;
}

/// Draws the board as ASCII, one character per cell
///
/// Later layers win: stones, slowdowns, powerups, bombs, foods, projectiles,
/// explosions, body, head.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render the board and HUD to a string
    pub fn frame(snapshot: &Snapshot) -> String {
        let (w, h) = (snapshot.grid_width, snapshot.grid_height);
        let mut rows = vec![vec!['.'; w as usize]; h as usize];
        let mut put = |pos: IVec2, c: char| {
            if pos.x >= 0 && pos.x < w && pos.y >= 0 && pos.y < h {
                rows[pos.y as usize][pos.x as usize] = c;
            }
        };

        snapshot.stones.iter().for_each(|p| put(*p, '#'));
        snapshot.slowdown_pickups.iter().for_each(|p| put(*p, 's'));
        snapshot.powerup_pickups.iter().for_each(|p| put(*p, 'P'));
        snapshot.bombs.iter().for_each(|b| put(b.pos, 'B'));
        snapshot.foods.iter().for_each(|f| put(f.pos, 'f'));
        snapshot.projectiles.iter().for_each(|p| put(*p, '*'));
        snapshot.explosions.iter().for_each(|e| put(e.pos, 'x'));
        snapshot.body.iter().skip(1).for_each(|p| put(*p, 'o'));
        if let Some(head) = snapshot.body.first() {
            put(*head, '@');
        }

        let mut frame = format!(
            "{:?} | level {} | score {} | shields {} | coins {} | speed {}\n",
            snapshot.phase,
            snapshot.level,
            snapshot.score,
            snapshot.shields,
            snapshot.coins,
            snapshot.speed
        );
        for row in rows {
            frame.extend(row);
            frame.push('\n');
        }
        if !snapshot.death_reason.is_empty() {
            frame.push_str(&format!("You {}!\n", snapshot.death_reason));
        }
        frame
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn present(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.out.write_all(Self::frame(snapshot).as_bytes())?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{Bomb, DeathReason, SpawnSource};

    fn small_session() -> Session {
        Session::new(Settings {
            grid_width: 6,
            grid_height: 4,
            ..Settings::without_random_spawns()
        })
    }

    #[test]
    fn test_snapshot_copies_state() {
        let mut session = small_session();
        session.setup_level(0, &mut Vec::new());
        session.hazards.bombs.push(Bomb {
            id: 77,
            pos: IVec2::new(0, 0),
            created_at: 0,
            radius: 2,
            source: SpawnSource::Roaming,
        });
        session.foods[0].bomb_ids.push(77);
        let fuse = session.settings.bomb_duration_ms;

        let snap = Snapshot::capture(&session, fuse / 2);
        assert_eq!(snap.body.len(), 3);
        assert_eq!(snap.body[0], session.player.head());
        assert_eq!(snap.foods.len(), 1);
        assert_eq!(snap.foods[0].bombs, vec![IVec2::new(0, 0)]);
        assert!((snap.bombs[0].fuse_left - 0.5).abs() < 0.01);
        assert!(snap.death_reason.is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = small_session();
        session.death_reason = Some(DeathReason::CollidedWithSelf);
        let json = serde_json::to_string(&Snapshot::capture(&session, 0)).unwrap();
        assert!(json.contains("collided with self"));
    }

    #[test]
    fn test_text_frame_marks_head_and_body() {
        let session = small_session();
        let frame = TextRenderer::<Vec<u8>>::frame(&Snapshot::capture(&session, 0));
        let board: Vec<&str> = frame.lines().skip(1).collect();
        assert_eq!(board.len(), 4);
        // Centre of 6x4 is (3, 2); body trails to the left
        assert_eq!(board[2], ".oo@..");
    }

    #[test]
    fn test_renderer_writes_to_sink() {
        let session = small_session();
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.present(&Snapshot::capture(&session, 0)).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.starts_with("Start | level 1"));
    }
}
