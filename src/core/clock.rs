use std::collections::VecDeque;
use std::time::Instant;

/// Source of per-frame time deltas
pub trait FrameClock {
    /// Seconds since the previous tick; advances the clock
    fn tick(&mut self) -> f32;
}

/// Minimal wall clock - just tracks delta time
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Reset clock to current time
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for Clock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }
}

/// Scripted clock for headless runs and tests
///
/// Yields queued deltas first, then `fallback` forever.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    queued: VecDeque<f32>,
    fallback: f32,
}

impl ManualClock {
    /// Clock that advances by the same delta every tick
    pub fn fixed(delta: f32) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: delta,
        }
    }

    /// Clock that yields `deltas` in order, then zero
    pub fn scripted(deltas: impl IntoIterator<Item = f32>) -> Self {
        Self {
            queued: deltas.into_iter().collect(),
            fallback: 0.0,
        }
    }

    pub fn push(&mut self, delta: f32) {
        self.queued.push_back(delta);
    }
}

impl FrameClock for ManualClock {
    fn tick(&mut self) -> f32 {
        self.queued.pop_front().unwrap_or(self.fallback)
    }
}
