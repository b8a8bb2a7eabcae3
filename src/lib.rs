// MyMusic Metronome - Library exports for the app, tests and benchmarks

pub mod audio;
pub mod config;
pub mod messaging;
pub mod sequencer;
pub mod trial;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, AudioError, RecordingSink, ToneSink};
pub use config::{ConfigError, MetronomeConfig};
pub use messaging::channels::create_command_channel;
pub use sequencer::{
    Clock, Direction, FrameTicks, FrameView, InputSource, MonotonicClock, SteppedClock, Tempo,
    TempoState, Transport, Variant,
};
pub use trial::{JsonFileStore, KeyValueStore, MemoryStore, SessionGate, StoreError};
