// Tap tempo - BPM estimation from manual taps
// Keeps the last taps in a fixed FIFO window and averages their intervals

use super::timeline::Tempo;
use std::collections::VecDeque;

/// Number of taps kept in the rolling window
pub const TAP_WINDOW: usize = 8;
/// Inactivity after which the window is cleared and tap mode exits
pub const TAP_TIMEOUT_MS: f64 = 2000.0;

#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<f64>,
    active: bool,
    timeout_ms: f64,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(TAP_WINDOW),
            active: false,
            timeout_ms: TAP_TIMEOUT_MS,
        }
    }

    /// Register a tap at `now`
    ///
    /// Returns the estimate only once two or more taps are in the window and
    /// the estimate lies in the accepted tempo range.
    pub fn tap(&mut self, now: f64) -> Option<Tempo> {
        self.poll(now);

        if self.taps.len() == TAP_WINDOW {
            self.taps.pop_front();
        }
        self.taps.push_back(now);
        self.active = true;

        let estimate = self.estimate_bpm()?;
        let tempo = Tempo::try_new(estimate);
        if tempo.is_none() {
            log::debug!("Tap estimate {} BPM out of range, ignored", estimate);
        }
        tempo
    }

    /// Rounded BPM from the mean interval of the window, unbounded
    pub fn estimate_bpm(&self) -> Option<i64> {
        if self.taps.len() < 2 {
            return None;
        }

        let (first, last) = (self.taps.front()?, self.taps.back()?);
        // Mean of consecutive differences telescopes to (last - first) / (n - 1)
        let avg_interval = (last - first) / (self.taps.len() - 1) as f64;
        if avg_interval <= 0.0 {
            return None;
        }

        Some((60_000.0 / avg_interval).round() as i64)
    }

    /// Expire the window after inactivity
    /// Returns true if tap mode was exited by this call
    pub fn poll(&mut self, now: f64) -> bool {
        match self.taps.back() {
            Some(&last) if self.active && now - last > self.timeout_ms => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.taps.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}
