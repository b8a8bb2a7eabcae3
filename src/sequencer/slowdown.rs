// Slowdown ramp - Trial session tempo decay
// Once the playing time passes the trial limit, the tempo drops a step per revolution

use super::metronome::is_near_top;
use super::timeline::{MIN_BPM, Tempo};

/// BPM removed at each top-of-cycle crossing
pub const DEFAULT_SLOWDOWN_STEP: u16 = 5;

/// Mid-cycle band re-arming the decrement
const MID_CYCLE_DEGREES: std::ops::RangeInclusive<f64> = 90.0..=270.0;

/// A frame pair wrapping from the last quarter into the first one crossed the top
fn wrapped_past_top(previous: f64, current: f64) -> bool {
    previous >= 270.0 && current <= 90.0
}

/// Per-play bookkeeping, created on play start and dropped on stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampState {
    pub running_seconds: u32,
    pub has_decremented_this_cycle: bool,
    pub original_bpm: Tempo,
    /// Phase seen by the previous check, to catch crossings between frames
    pub last_phase_degrees: Option<f64>,
}

/// What the controller must do after a slowdown check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowdownAction {
    None,
    /// Switch to the given tempo, keeping the visual phase
    Decrement(Tempo),
    /// Tempo would reach the floor: stop playback
    Stop,
}

#[derive(Debug, Clone)]
pub struct SlowdownRamp {
    /// Seconds of play before the ramp engages; `None` never engages
    threshold_seconds: Option<u32>,
    step: u16,
    state: Option<RampState>,
    next_second_at: f64,
}

impl SlowdownRamp {
    pub fn new(threshold_seconds: Option<u32>, step: u16) -> Self {
        Self {
            threshold_seconds,
            step,
            state: None,
            next_second_at: 0.0,
        }
    }

    pub fn threshold_seconds(&self) -> Option<u32> {
        self.threshold_seconds
    }

    pub fn set_threshold_seconds(&mut self, threshold_seconds: Option<u32>) {
        self.threshold_seconds = threshold_seconds;
    }

    pub fn state(&self) -> Option<&RampState> {
        self.state.as_ref()
    }

    /// Begin tracking a play session at `now`
    pub fn start(&mut self, now: f64, tempo: Tempo) {
        self.state = Some(RampState {
            running_seconds: 0,
            has_decremented_this_cycle: false,
            original_bpm: tempo,
            last_phase_degrees: None,
        });
        self.next_second_at = now + 1000.0;
    }

    /// Forget the play session; returns the tempo captured at play start
    pub fn clear(&mut self) -> Option<Tempo> {
        self.state.take().map(|state| state.original_bpm)
    }

    /// Count whole seconds of play up to `now`
    pub fn tick_seconds(&mut self, now: f64) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        while now >= self.next_second_at {
            state.running_seconds += 1;
            self.next_second_at += 1000.0;
        }
    }

    /// True once the accumulated play time reached the threshold
    pub fn is_engaged(&self) -> bool {
        match (self.state, self.threshold_seconds) {
            (Some(state), Some(threshold)) => state.running_seconds >= threshold,
            _ => false,
        }
    }

    /// Check the phase of the current frame against the decrement rule
    ///
    /// A crossing is a frame inside the top band, or a frame that wrapped past
    /// the top since the previous one (sparse frames at high tempo can skip
    /// the band entirely).
    pub fn check(&mut self, phase_degrees: f64, tempo: Tempo) -> SlowdownAction {
        let engaged = self.is_engaged();
        let step = self.step as i32;
        let Some(state) = self.state.as_mut() else {
            return SlowdownAction::None;
        };
        let previous = state.last_phase_degrees.replace(phase_degrees);
        if !engaged {
            return SlowdownAction::None;
        }

        if MID_CYCLE_DEGREES.contains(&phase_degrees) {
            state.has_decremented_this_cycle = false;
            return SlowdownAction::None;
        }

        let crossed = is_near_top(phase_degrees)
            || previous.is_some_and(|previous| wrapped_past_top(previous, phase_degrees));
        if !crossed || state.has_decremented_this_cycle {
            return SlowdownAction::None;
        }

        state.has_decremented_this_cycle = true;
        let next = tempo.bpm() as i32 - step;
        if next <= MIN_BPM as i32 {
            SlowdownAction::Stop
        } else {
            SlowdownAction::Decrement(Tempo::new(next as u16))
        }
    }
}
