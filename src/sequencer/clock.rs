// Clock sampler - Monotonic frame timestamps
// Turns the host's per-frame callback into an endless sequence of millisecond timestamps

use std::cell::Cell;
use std::time::Instant;

/// Monotonic time source in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock based on `Instant`, origin at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock: every read returns the current time, then advances by one frame
///
/// Used to drive the metronome headless (tests, benchmarks) at a fixed refresh rate.
#[derive(Debug, Clone)]
pub struct SteppedClock {
    current: Cell<f64>,
    frame_ms: f64,
}

impl SteppedClock {
    pub fn new(start_ms: f64, frame_ms: f64) -> Self {
        Self {
            current: Cell::new(start_ms),
            frame_ms,
        }
    }

    /// Clock stepping at the given refresh rate (e.g. 60.0 Hz)
    pub fn at_refresh_rate(start_ms: f64, hz: f64) -> Self {
        Self::new(start_ms, 1000.0 / hz)
    }

    /// Delay the next frame by `ms` (simulates a stalled frame)
    pub fn stall(&self, ms: f64) {
        self.current.set(self.current.get() + ms);
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }
}

impl Clock for SteppedClock {
    fn now_ms(&self) -> f64 {
        let now = self.current.get();
        self.current.set(now + self.frame_ms);
        now
    }
}

/// Lazy, infinite sequence of frame timestamps
/// Each `next()` samples the clock exactly once
#[derive(Debug, Clone)]
pub struct FrameTicks<C: Clock> {
    clock: C,
}

impl<C: Clock> FrameTicks<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Iterator for FrameTicks<C> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.clock.now_ms())
    }
}
