//! Platform abstraction layer
//!
//! Handles the outside world for the simulation:
//! - Time (monotonic milliseconds)
//! - Frame pacing
//! - Input events

use std::cell::Cell;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::sim::{KeyEvent, Session, autopilot_keys};

/// Source of monotonic time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Jump to `ms`; time never goes backwards
    pub fn set(&self, ms: u64) {
        self.now.set(self.now.get().max(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Sleeps so that frames are delivered at a target rate
#[derive(Debug, Default)]
pub struct FramePacer {
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new() -> Self {
        Self { last_frame: None }
    }

    /// Target duration of one frame at `ticks_per_second`
    pub fn frame_duration(ticks_per_second: u32) -> Duration {
        Duration::from_millis(1000 / u64::from(ticks_per_second.max(1)))
    }

    /// Block until one frame has passed since the previous call
    pub fn wait(&mut self, ticks_per_second: u32) {
        let frame = Self::frame_duration(ticks_per_second);
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < frame {
                std::thread::sleep(frame - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

/// Produces the key presses for one tick
pub trait InputSource {
    /// Drain everything pressed since the last poll, in order
    fn poll(&mut self, session: &Session, now: u64) -> Vec<KeyEvent>;
}

/// Replays a fixed list of per-tick key batches, then goes quiet
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<KeyEvent>>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = Vec<KeyEvent>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _session: &Session, _now: u64) -> Vec<KeyEvent> {
        self.frames.pop_front().unwrap_or_default()
    }
}

/// Demo player input
#[derive(Debug, Default, Clone, Copy)]
pub struct AutopilotInput;

impl InputSource for AutopilotInput {
    fn poll(&mut self, session: &Session, now: u64) -> Vec<KeyEvent> {
        autopilot_keys(session, now)
    }
}
