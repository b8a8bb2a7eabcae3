// Sequencer module - Metronome timing core
// Clock sampling, beat phase, tap tempo and tempo ramps, tied together by the transport

pub mod clock;
pub mod metronome;
pub mod ramp;
pub mod slowdown;
pub mod tap_tempo;
pub mod timeline;
pub mod transport;

pub use clock::{Clock, FrameTicks, MonotonicClock, SteppedClock};
pub use metronome::{BeatTracker, PendulumTracker, TimingAnchor, Variant};
pub use ramp::{Direction, HoldRamp, InputSource, RampTier};
pub use slowdown::{RampState, SlowdownAction, SlowdownRamp};
pub use tap_tempo::TapTempo;
pub use timeline::{MAX_BPM, MIN_BPM, Tempo};
pub use transport::{FrameView, TempoState, Transport};
