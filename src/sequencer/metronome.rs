// Metronome - Beat phase engine
// Derives a continuous beat phase and discrete beat events from a free-running clock

use super::timeline::Tempo;
use std::f64::consts::TAU;

/// Half-width of the band around the top of the cycle (0°/360°), in degrees
pub const TOP_BAND_DEGREES: f64 = 5.0;

/// Pendulum beats fire when the swing angle is within this many degrees of vertical
pub const PENDULUM_ZERO_TOLERANCE_DEGREES: f64 = 5.0;

/// Minimum spacing between two pendulum beats, as a fraction of the beat duration
pub const PENDULUM_HYSTERESIS: f64 = 0.8;

/// Which metronome face is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Variant {
    /// Dot travelling around a circle, one revolution per beat
    #[default]
    Circular,
    /// Triangular pendulum, one left-right-left swing per two beats
    Pendulum,
}

/// True if a phase in degrees lies within the top-of-cycle band
pub fn is_near_top(phase_degrees: f64) -> bool {
    phase_degrees < TOP_BAND_DEGREES || phase_degrees > 360.0 - TOP_BAND_DEGREES
}

/// Monotonic timestamps anchoring phase computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingAnchor {
    /// Origin of the visual phase
    pub start_time: f64,
    /// Time of the most recent beat, drives beat firing
    pub last_beat_time: f64,
}

impl TimingAnchor {
    pub fn at(now: f64) -> Self {
        Self {
            start_time: now,
            last_beat_time: now,
        }
    }

    /// Restart the phase from zero at `now`
    pub fn reset(&mut self, now: f64) {
        self.start_time = now;
        self.last_beat_time = now;
    }

    /// Visual phase in [0, 1) for the given beat duration
    pub fn phase_at(&self, now: f64, beat_ms: f64) -> f64 {
        let elapsed = (now - self.start_time).max(0.0);
        let phase = elapsed.rem_euclid(beat_ms) / beat_ms;
        if phase >= 1.0 { 0.0 } else { phase }
    }

    /// Move the anchor so that `now` sits `beats_into_cycle` beats of `beat_ms` after the start
    ///
    /// Keeps the dot (or the pendulum arm) where it is across a tempo change.
    /// The beat anchor is only moved along when `resync_beat` is set, otherwise
    /// beat timing keeps its old origin.
    pub fn rebase(&mut self, now: f64, beats_into_cycle: f64, beat_ms: f64, resync_beat: bool) {
        self.start_time = now - beats_into_cycle * beat_ms;
        if resync_beat {
            self.last_beat_time = now - beats_into_cycle.fract() * beat_ms;
        }
    }
}

/// Result of sampling the beat tracker at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatSample {
    /// Cycle fraction in [0, 1)
    pub phase: f64,
    /// A beat fired during this sample
    pub fired: bool,
    /// Whole beats the anchor advanced by (more than one after a stalled frame)
    pub beats_elapsed: u32,
}

impl BeatSample {
    pub fn phase_degrees(&self) -> f64 {
        self.phase * 360.0
    }
}

/// Circular beat tracker with drift correction
///
/// A late sample advances the anchor by every missed beat at once and still
/// reports a single fired beat, so a stall never produces a burst of clicks.
#[derive(Debug, Clone)]
pub struct BeatTracker {
    anchor: TimingAnchor,
}

impl BeatTracker {
    pub fn new(now: f64) -> Self {
        Self {
            anchor: TimingAnchor::at(now),
        }
    }

    pub fn reset(&mut self, now: f64) {
        self.anchor.reset(now);
    }

    pub fn anchor(&self) -> &TimingAnchor {
        &self.anchor
    }

    pub fn anchor_mut(&mut self) -> &mut TimingAnchor {
        &mut self.anchor
    }

    /// Sample the tracker at `now`
    pub fn sample(&mut self, now: f64, tempo: Tempo) -> BeatSample {
        let beat_ms = tempo.beat_duration_ms();
        let elapsed = now - self.anchor.last_beat_time;

        let mut beats_elapsed = 0;
        if elapsed >= beat_ms {
            let missed = (elapsed / beat_ms).floor();
            self.anchor.last_beat_time += missed * beat_ms;
            beats_elapsed = missed as u32;
        }

        BeatSample {
            phase: self.anchor.phase_at(now, beat_ms),
            fired: beats_elapsed > 0,
            beats_elapsed,
        }
    }

    /// Visual phase without advancing the beat anchor
    pub fn peek_phase(&self, now: f64, tempo: Tempo) -> f64 {
        self.anchor.phase_at(now, tempo.beat_duration_ms())
    }
}

/// Result of sampling the pendulum at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumSample {
    /// Swing angle in degrees, positive to the right
    pub angle: f64,
    /// Position within the two-beat swing, in [0, 1)
    pub progress: f64,
    pub fired: bool,
}

/// Pendulum swing with zero-crossing beat detection
///
/// One full left-right-left swing spans two beats. A beat fires when the arm
/// passes vertical and at least `PENDULUM_HYSTERESIS` of a beat has elapsed
/// since the previous one.
#[derive(Debug, Clone)]
pub struct PendulumTracker {
    max_angle: f64,
    last_fire: Option<f64>,
    last_angle: Option<f64>,
}

impl PendulumTracker {
    pub fn new(max_angle: f64) -> Self {
        Self {
            max_angle: max_angle.abs(),
            last_fire: None,
            last_angle: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_fire = None;
        self.last_angle = None;
    }

    /// Swing angle for a cycle progress in [0, 1)
    pub fn angle_for_progress(&self, progress: f64) -> f64 {
        self.max_angle * (TAU * progress).cos()
    }

    pub fn sample(&mut self, now: f64, tempo: Tempo, anchor: &TimingAnchor) -> PendulumSample {
        let beat_ms = tempo.beat_duration_ms();
        let cycle_ms = 2.0 * beat_ms;
        let elapsed = (now - anchor.start_time).max(0.0);
        let mut progress = elapsed.rem_euclid(cycle_ms) / cycle_ms;
        if progress >= 1.0 {
            progress = 0.0;
        }
        let angle = self.angle_for_progress(progress);

        let in_band = angle.abs() <= PENDULUM_ZERO_TOLERANCE_DEGREES;
        let sign_flipped = self
            .last_angle
            .is_some_and(|previous| previous.signum() != angle.signum() && previous != 0.0);
        let rested = self
            .last_fire
            .is_none_or(|fired_at| now - fired_at >= PENDULUM_HYSTERESIS * beat_ms);

        let fired = (in_band || sign_flipped) && rested;
        if fired {
            self.last_fire = Some(now);
        }
        self.last_angle = Some(angle);

        PendulumSample {
            angle,
            progress,
            fired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyclic_distance(phase: f64) -> f64 {
        phase.min(1.0 - phase)
    }

    #[test]
    fn test_phase_completes_one_cycle_per_beat() {
        let tempo = Tempo::new(120);
        let mut tracker = BeatTracker::new(1000.0);

        let quarter = tracker.sample(1125.0, tempo);
        assert!((quarter.phase - 0.25).abs() < 1e-9);
        assert!(!quarter.fired);

        let half = tracker.sample(1250.0, tempo);
        assert!((half.phase_degrees() - 180.0).abs() < 1e-9);

        let beat = tracker.sample(1500.0, tempo);
        assert!(beat.fired);
        assert!(cyclic_distance(beat.phase) < 1e-9);
    }

    #[test]
    fn test_drift_correction_single_fire() {
        let tempo = Tempo::new(120);
        let mut tracker = BeatTracker::new(0.0);

        // 2.5 beats late
        let sample = tracker.sample(1250.0, tempo);
        assert!(sample.fired);
        assert_eq!(sample.beats_elapsed, 2);
        assert_eq!(tracker.anchor().last_beat_time, 1000.0);
        assert!((sample.phase - 0.5).abs() < 1e-9);

        // Next sample mid-beat does not fire again
        let sample = tracker.sample(1300.0, tempo);
        assert!(!sample.fired);
    }

    #[test]
    fn test_last_beat_lags_now_by_less_than_a_beat() {
        let tempo = Tempo::new(97);
        let beat_ms = tempo.beat_duration_ms();
        let mut tracker = BeatTracker::new(0.0);
        let mut now = 0.0;
        for step in [16.7, 33.0, 400.0, 2000.0, 8.0, 1234.5] {
            now += step;
            tracker.sample(now, tempo);
            let lag = now - tracker.anchor().last_beat_time;
            assert!(lag >= 0.0 && lag < beat_ms);
        }
    }

    #[test]
    fn test_rebase_preserves_phase() {
        let mut anchor = TimingAnchor::at(0.0);
        let old_beat = Tempo::new(100).beat_duration_ms();
        let now = 610.0;
        let phase = anchor.phase_at(now, old_beat);

        let new_beat = Tempo::new(95).beat_duration_ms();
        anchor.rebase(now, phase, new_beat, true);

        assert!((anchor.phase_at(now, new_beat) - phase).abs() < 1e-9);
        assert_eq!(anchor.last_beat_time, anchor.start_time);
    }

    #[test]
    fn test_rebase_without_resync_keeps_beat_anchor() {
        let mut anchor = TimingAnchor::at(0.0);
        anchor.last_beat_time = 600.0;
        anchor.rebase(700.0, 0.5, 400.0, false);
        assert_eq!(anchor.start_time, 500.0);
        assert_eq!(anchor.last_beat_time, 600.0);
    }

    #[test]
    fn test_rebase_across_second_beat_of_swing() {
        let mut anchor = TimingAnchor::at(0.0);
        anchor.rebase(5000.0, 1.5, 600.0, true);
        assert_eq!(anchor.start_time, 4100.0);
        assert_eq!(anchor.last_beat_time, 4700.0);
    }

    #[test]
    fn test_near_top_band() {
        assert!(is_near_top(0.0));
        assert!(is_near_top(4.9));
        assert!(is_near_top(355.5));
        assert!(!is_near_top(5.0));
        assert!(!is_near_top(180.0));
    }

    #[test]
    fn test_pendulum_starts_at_extreme() {
        let tempo = Tempo::new(60);
        let anchor = TimingAnchor::at(0.0);
        let mut pendulum = PendulumTracker::new(30.0);

        let sample = pendulum.sample(0.0, tempo, &anchor);
        assert!((sample.angle - 30.0).abs() < 1e-9);
        assert!(!sample.fired);

        // Half a beat later the arm is vertical
        let sample = pendulum.sample(500.0, tempo, &anchor);
        assert!(sample.angle.abs() < 1e-9);
        assert!(sample.fired);
    }

    #[test]
    fn test_pendulum_fires_once_per_beat() {
        let tempo = Tempo::new(60);
        let anchor = TimingAnchor::at(0.0);
        let mut pendulum = PendulumTracker::new(30.0);

        let mut fires = Vec::new();
        let mut now = 0.0;
        while now < 4000.0 {
            if pendulum.sample(now, tempo, &anchor).fired {
                fires.push(now);
            }
            now += 4.0;
        }

        assert_eq!(fires.len(), 4);
        for pair in fires.windows(2) {
            assert!((pair[1] - pair[0] - 1000.0).abs() < 50.0);
        }
    }

    #[test]
    fn test_pendulum_hysteresis_blocks_double_fire() {
        let tempo = Tempo::new(60);
        let anchor = TimingAnchor::at(0.0);
        let mut pendulum = PendulumTracker::new(30.0);

        // Several samples inside the tolerance band around the first crossing
        let fired: Vec<bool> = [490.0, 495.0, 500.0, 505.0, 510.0]
            .iter()
            .map(|&t| pendulum.sample(t, tempo, &anchor).fired)
            .collect();
        assert_eq!(fired.iter().filter(|&&f| f).count(), 1);
    }

    #[test]
    fn test_pendulum_sign_flip_detected_between_sparse_frames() {
        let tempo = Tempo::new(240);
        let anchor = TimingAnchor::at(0.0);
        let mut pendulum = PendulumTracker::new(30.0);

        // Frames straddle the crossing at 125ms without landing in the band
        assert!(!pendulum.sample(100.0, tempo, &anchor).fired);
        assert!(pendulum.sample(150.0, tempo, &anchor).fired);
    }
}
