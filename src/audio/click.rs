// Click voice - Short sine tone with an exponential decay
// Rendered sample by sample inside the audio callback, no allocation

use std::f32::consts::TAU;

/// Level the envelope decays to over the tone duration
pub const DECAY_FLOOR: f32 = 0.001;

/// One click request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_s: f32,
    pub peak_gain: f32,
}

impl Tone {
    pub fn new(frequency_hz: f32, duration_s: f32, peak_gain: f32) -> Self {
        Self {
            frequency_hz,
            duration_s,
            peak_gain: peak_gain.clamp(0.0, 1.0),
        }
    }
}

/// Monophonic click generator
/// A new trigger restarts the tone from full gain (instant attack)
#[derive(Debug, Clone)]
pub struct ClickVoice {
    sample_rate: f32,
    phase: f32,
    phase_increment: f32,
    gain: f32,
    decay: f32,
    remaining: usize,
}

impl ClickVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            phase_increment: 0.0,
            gain: 0.0,
            decay: 1.0,
            remaining: 0,
        }
    }

    pub fn trigger(&mut self, tone: Tone) {
        let length = (tone.duration_s * self.sample_rate).round().max(1.0);

        self.phase = 0.0;
        self.phase_increment = TAU * tone.frequency_hz / self.sample_rate;
        self.gain = tone.peak_gain;
        // gain * decay^length == gain * DECAY_FLOOR
        self.decay = DECAY_FLOOR.powf(1.0 / length);
        self.remaining = length as usize;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }

        let sample = self.phase.sin() * self.gain;

        self.phase += self.phase_increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        self.gain *= self.decay;
        self.remaining -= 1;

        sample
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
        self.gain = 0.0;
    }
}
