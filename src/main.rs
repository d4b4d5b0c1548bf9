//! Snakelite entry point
//!
//! Runs a demo session in the terminal: the autopilot plays through the
//! levels in real time until it wins, dies, or is stopped.

use std::io;

use snakelite::Settings;
use snakelite::platform::{AutopilotInput, Clock, FramePacer, InputSource, SystemClock};
use snakelite::renderer::{Renderer, Snapshot, TextRenderer};
use snakelite::sim::{GamePhase, Session, tick};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Snakelite starting...");
    let settings = Settings::load();
    let mut session = Session::new(settings);

    let clock = SystemClock::new();
    let mut pacer = FramePacer::new();
    let mut input = AutopilotInput;
    let mut renderer = TextRenderer::new(io::stdout().lock());

    loop {
        let now = clock.now_ms();
        let keys = input.poll(&session, now);
        let result = tick(&mut session, keys, now);
        if result.quit {
            break;
        }
        for event in &result.events {
            log::debug!("{event:?}");
        }

        let snapshot = Snapshot::capture(&session, now);
        if let Err(e) = renderer.present(&snapshot) {
            log::error!("Render error: {e}");
            break;
        }

        if matches!(
            session.phase,
            GamePhase::Victory | GamePhase::GameOver | GamePhase::Shop
        ) {
            match serde_json::to_string(&snapshot) {
                Ok(json) => log::info!("Final state: {json}"),
                Err(e) => log::warn!("Could not serialize final state: {e}"),
            }
            break;
        }

        pacer.wait(session.current_speed);
    }

    log::info!(
        "Run ended at level {} with score {} ({} coins banked)",
        session.level,
        session.score,
        session.coins
    );
}
