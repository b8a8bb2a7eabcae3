// Transport - Session controller for the metronome
// Owns the tempo and play state; every input and every frame goes through here

use super::metronome::{BeatTracker, PendulumTracker, Variant, is_near_top};
use super::ramp::{Direction, HoldRamp, InputSource, RampTier};
use super::slowdown::{SlowdownAction, SlowdownRamp};
use super::tap_tempo::TapTempo;
use super::timeline::Tempo;
use crate::audio::engine::ToneSink;
use crate::config::MetronomeConfig;
use crate::trial::gate::SessionGate;
use crate::trial::store::{KeyValueStore, StoreResult};
use crate::ui::visual::{DotPosition, ZoomLatch, circle_position, pendulum_tip};

/// Length of the pendulum arm, in percent of the face height
pub const PENDULUM_ARM_LENGTH: f64 = 80.0;

/// Tempo and play flag, the only state shared with the outside world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoState {
    pub bpm: Tempo,
    pub is_playing: bool,
}

/// Everything the UI needs to draw one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub bpm: Tempo,
    pub is_playing: bool,
    pub phase_degrees: f64,
    pub pendulum_angle: f64,
    /// Dot on the circle, or pendulum tip, in percentage units
    pub dot: DotPosition,
    pub scale: f64,
    pub beat_fired: bool,
    pub tap_mode: bool,
    pub slowing_down: bool,
    pub upgrade_prompt: bool,
    pub hold_tier: Option<RampTier>,
}

/// Metronome session controller
///
/// Single-threaded: the host calls `tick` once per display refresh and the
/// input methods from its event handlers. Timers (hold repeat, play-time
/// counter, tap timeout) are advanced by `tick` rather than by callbacks.
pub struct Transport<A: ToneSink> {
    config: MetronomeConfig,
    state: TempoState,
    variant: Variant,
    beat: BeatTracker,
    pendulum: PendulumTracker,
    tap: TapTempo,
    increase: HoldRamp,
    decrease: HoldRamp,
    slowdown: SlowdownRamp,
    zoom: ZoomLatch,
    gate: SessionGate,
    audio: A,
    upgrade_prompt: bool,
}

impl<A: ToneSink> Transport<A> {
    pub fn new(config: MetronomeConfig, gate: SessionGate, audio: A, now: f64) -> Self {
        let slowdown = SlowdownRamp::new(
            gate.slowdown_threshold(&config.trial),
            config.trial.slowdown_step,
        );

        Self {
            state: TempoState {
                bpm: config.initial_bpm,
                is_playing: false,
            },
            variant: config.variant,
            beat: BeatTracker::new(now),
            pendulum: PendulumTracker::new(config.pendulum_max_angle),
            tap: TapTempo::new(),
            increase: HoldRamp::new(Direction::Increase),
            decrease: HoldRamp::new(Direction::Decrease),
            slowdown,
            zoom: ZoomLatch::new(),
            gate,
            audio,
            upgrade_prompt: false,
            config,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.state.bpm
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn is_tap_mode(&self) -> bool {
        self.tap.is_active()
    }

    pub fn is_slowing_down(&self) -> bool {
        self.slowdown.is_engaged()
    }

    pub fn upgrade_prompt(&self) -> bool {
        self.upgrade_prompt
    }

    /// Start playback; the phase restarts from the top
    pub fn play(&mut self, now: f64) {
        if self.state.is_playing {
            return;
        }
        // Tap mode and playback are mutually exclusive
        self.tap.clear();

        self.state.is_playing = true;
        self.beat.reset(now);
        self.pendulum.reset();
        self.slowdown.start(now, self.state.bpm);
        self.zoom.start();
        self.upgrade_prompt = false;
        log::info!("Playing at {}", self.state.bpm);
    }

    /// Stop playback and cancel every pending timer
    ///
    /// Safe to call any number of times. If the slowdown ramp had taken over,
    /// the tempo captured at play start is restored.
    pub fn stop(&mut self) {
        self.increase.cancel();
        self.decrease.cancel();

        let was_slowing_down = self.slowdown.is_engaged();
        let original = self.slowdown.clear();
        if let Some(original) = original.filter(|_| was_slowing_down) {
            self.state.bpm = original;
        }

        self.zoom.stop();
        self.pendulum.reset();

        if self.state.is_playing {
            self.state.is_playing = false;
            self.audio.suspend();
            log::info!("Stopped at {}", self.state.bpm);
        }
    }

    pub fn toggle_play(&mut self, now: f64) {
        if self.state.is_playing {
            self.stop();
        } else {
            self.play(now);
        }
    }

    /// Set the tempo directly (clamped)
    /// Ignored while the slowdown ramp owns the tempo; returns whether it applied
    pub fn set_bpm(&mut self, bpm: u16, now: f64) -> bool {
        if self.slowdown.is_engaged() {
            log::debug!("Tempo change ignored during slowdown");
            return false;
        }
        self.apply_tempo(Tempo::new(bpm), now);
        true
    }

    pub fn set_variant(&mut self, variant: Variant, now: f64) {
        if self.variant == variant {
            return;
        }
        self.variant = variant;
        if self.state.is_playing {
            self.beat.reset(now);
            self.pendulum.reset();
        }
    }

    /// Press a +/- control
    pub fn press(&mut self, direction: Direction, source: InputSource, now: f64) {
        if self.slowdown.is_engaged() {
            return;
        }
        let steps = self.hold_mut(direction).press(now, source);
        for _ in 0..steps {
            self.step_tempo(direction, now);
        }
    }

    pub fn release(&mut self, direction: Direction, source: InputSource) {
        self.hold_mut(direction).release(source);
    }

    /// Register a tap on the tap-tempo control
    pub fn tap(&mut self, now: f64) {
        let was_slowing_down = self.slowdown.is_engaged();
        if self.state.is_playing {
            self.stop();
        }

        self.click();
        if let Some(estimate) = self.tap.tap(now) {
            if was_slowing_down {
                log::debug!("Tap estimate {} ignored during slowdown", estimate);
            } else {
                self.apply_tempo(estimate, now);
            }
        }
    }

    pub fn dismiss_upgrade_prompt(&mut self) {
        self.upgrade_prompt = false;
    }

    /// Record the upgrade and lift the trial limit for the rest of the session
    pub fn mark_upgraded(&mut self, store: &mut dyn KeyValueStore) -> StoreResult<()> {
        self.gate.mark_upgraded(store)?;
        self.slowdown
            .set_threshold_seconds(self.gate.slowdown_threshold(&self.config.trial));
        self.upgrade_prompt = false;
        Ok(())
    }

    /// Advance timers and compute the frame at `now`
    pub fn tick(&mut self, now: f64) -> FrameView {
        if self.tap.poll(now) {
            log::debug!("Tap mode timed out");
        }

        if self.slowdown.is_engaged() {
            self.increase.cancel();
            self.decrease.cancel();
        }
        for direction in [Direction::Increase, Direction::Decrease] {
            let steps = self.hold_mut(direction).poll(now);
            for _ in steps {
                self.step_tempo(direction, now);
            }
        }

        // One tempo read per frame
        let tempo = self.state.bpm;

        if !self.state.is_playing {
            return self.idle_view();
        }

        self.slowdown.tick_seconds(now);

        let beat = self.beat.sample(now, tempo);
        let (fired, pendulum_angle, beats_into_cycle) = match self.variant {
            Variant::Circular => (beat.fired, 0.0, beat.phase),
            Variant::Pendulum => {
                let swing = self.pendulum.sample(now, tempo, self.beat.anchor());
                (swing.fired, swing.angle, swing.progress * 2.0)
            }
        };
        if fired {
            self.click();
        }

        let phase_degrees = beat.phase_degrees();
        match self.slowdown.check(phase_degrees, tempo) {
            SlowdownAction::None => {}
            SlowdownAction::Decrement(slower) => {
                log::debug!("Slowdown: {} -> {}", tempo, slower);
                self.state.bpm = slower;
                // Beat timing is resynced only for crossings landing on the top itself
                self.beat.anchor_mut().rebase(
                    now,
                    beats_into_cycle,
                    slower.beat_duration_ms(),
                    is_near_top(phase_degrees),
                );
            }
            SlowdownAction::Stop => {
                log::info!("Slowdown reached the tempo floor");
                self.stop();
                if self.gate.is_restricted() {
                    self.upgrade_prompt = true;
                }
                return self.idle_view();
            }
        }

        let scale = self.zoom.update(phase_degrees);
        let dot = match self.variant {
            Variant::Circular => circle_position(phase_degrees),
            Variant::Pendulum => pendulum_tip(pendulum_angle, PENDULUM_ARM_LENGTH),
        };

        FrameView {
            bpm: self.state.bpm,
            is_playing: true,
            phase_degrees,
            pendulum_angle,
            dot,
            scale,
            beat_fired: fired,
            tap_mode: self.tap.is_active(),
            slowing_down: self.slowdown.is_engaged(),
            upgrade_prompt: self.upgrade_prompt,
            hold_tier: self.active_tier(),
        }
    }

    fn idle_view(&self) -> FrameView {
        let dot = match self.variant {
            Variant::Circular => circle_position(0.0),
            Variant::Pendulum => pendulum_tip(0.0, PENDULUM_ARM_LENGTH),
        };
        FrameView {
            bpm: self.state.bpm,
            is_playing: false,
            phase_degrees: 0.0,
            pendulum_angle: 0.0,
            dot,
            scale: self.zoom.scale(0.0),
            beat_fired: false,
            tap_mode: self.tap.is_active(),
            slowing_down: false,
            upgrade_prompt: self.upgrade_prompt,
            hold_tier: self.active_tier(),
        }
    }

    fn active_tier(&self) -> Option<RampTier> {
        self.increase.tier().or(self.decrease.tier())
    }

    fn hold_mut(&mut self, direction: Direction) -> &mut HoldRamp {
        match direction {
            Direction::Increase => &mut self.increase,
            Direction::Decrease => &mut self.decrease,
        }
    }

    fn step_tempo(&mut self, direction: Direction, now: f64) {
        let next = self.state.bpm.offset(direction.step());
        self.apply_tempo(next, now);
    }

    /// Change the tempo; while playing the phase snaps back to the top
    fn apply_tempo(&mut self, tempo: Tempo, now: f64) {
        if tempo == self.state.bpm {
            return;
        }
        self.state.bpm = tempo;
        if self.state.is_playing {
            self.beat.reset(now);
            self.pendulum.reset();
        }
        log::debug!("Tempo set to {}", tempo);
    }

    fn click(&mut self) {
        let click = self.config.click;
        self.audio
            .play_tone(click.frequency_hz, click.duration_s, click.peak_gain);
    }
}
