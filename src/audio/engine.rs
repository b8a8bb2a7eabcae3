// Audio engine - cpal output stream playing metronome clicks
//
// The UI thread pushes `Command::PlayTone` into a lock-free ringbuffer; the
// real-time callback pops it and renders the click with `ClickVoice`. Internal
// processing is f32, converted to the device format (F32, I16 or U16) on write.
//
// Every failure here is non-fatal for the metronome: the controller keeps
// animating and firing beats whether or not a click can be heard.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};

use crate::audio::click::{ClickVoice, Tone};
use crate::audio::status::{AtomicStreamState, StreamState};
use crate::messaging::channels::{CommandConsumer, CommandProducer, create_command_channel};
use crate::messaging::command::Command;

/// Pending click requests; a handful per frame at most
const COMMAND_RINGBUFFER_CAPACITY: usize = 64;

/// Audio error types
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Stream creation failed: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Stream start failed: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Stream pause failed: {0}")]
    Pause(#[from] cpal::PauseStreamError),

    #[error("Unsupported sample format: {0:?}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(SampleFormat),
}

/// Audio collaborator of the metronome
pub trait ToneSink {
    /// Play a decaying sine tone; must never fail loudly
    fn play_tone(&mut self, frequency_hz: f32, duration_s: f32, peak_gain: f32);

    /// Hint that no tone will be needed for a while
    fn suspend(&mut self) {}
}

/// Audio unavailable: ticks stay silent
impl<T: ToneSink> ToneSink for Option<T> {
    fn play_tone(&mut self, frequency_hz: f32, duration_s: f32, peak_gain: f32) {
        if let Some(sink) = self {
            sink.play_tone(frequency_hz, duration_s, peak_gain);
        }
    }

    fn suspend(&mut self) {
        if let Some(sink) = self {
            sink.suspend();
        }
    }
}

impl<T: ToneSink + ?Sized> ToneSink for Box<T> {
    fn play_tone(&mut self, frequency_hz: f32, duration_s: f32, peak_gain: f32) {
        (**self).play_tone(frequency_hz, duration_s, peak_gain);
    }

    fn suspend(&mut self) {
        (**self).suspend();
    }
}

pub struct AudioEngine {
    _device: Device,
    stream: Stream,
    command_tx: CommandProducer,
    state: AtomicStreamState,
}

impl AudioEngine {
    /// Open the default output device and start the click stream
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();
        log::debug!("Audio config: {:?}, format {:?}", config, sample_format);

        let (command_tx, command_rx) = create_command_channel(COMMAND_RINGBUFFER_CAPACITY);
        let state = AtomicStreamState::new(StreamState::Running);

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, channels, command_rx, state.clone())
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, channels, command_rx, state.clone())
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, channels, command_rx, state.clone())
            }
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        stream.play()?;
        log::info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            _device: device,
            stream,
            command_tx,
            state,
        })
    }

    pub fn state(&self) -> StreamState {
        self.state.get()
    }

    /// Resume a suspended stream; running or failed streams are left alone
    fn ensure_running(&mut self) -> Result<(), AudioError> {
        if self.state.get() == StreamState::Suspended {
            self.stream.play()?;
            self.state.set(StreamState::Running);
            log::debug!("Audio stream resumed");
        }
        Ok(())
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut command_rx: CommandConsumer,
        state: AtomicStreamState,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut voice = ClickVoice::new(config.sample_rate.0 as f32);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no blocking locks
                while let Some(command) = command_rx.try_pop() {
                    match command {
                        Command::PlayTone(tone) => voice.trigger(tone),
                        Command::Silence => voice.reset(),
                    }
                }

                for frame in data.chunks_mut(channels) {
                    let sample: T = Sample::from_sample::<f32>(voice.next_sample());
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = sample;
                    }
                }
            },
            move |err| {
                // Runs outside the real-time callback, logging is fine here
                log::error!("Audio stream error: {}", err);
                state.set(StreamState::Failed);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl ToneSink for AudioEngine {
    fn play_tone(&mut self, frequency_hz: f32, duration_s: f32, peak_gain: f32) {
        if let Err(e) = self.ensure_running() {
            log::warn!("Could not resume audio stream: {}", e);
            return;
        }

        let tone = Tone::new(frequency_hz, duration_s, peak_gain);
        if self.command_tx.try_push(Command::PlayTone(tone)).is_err() {
            log::debug!("Click dropped, command queue full");
        }
    }

    fn suspend(&mut self) {
        if self.state.get() != StreamState::Running {
            return;
        }
        let _ = self.command_tx.try_push(Command::Silence);
        match self.stream.pause() {
            Ok(()) => self.state.set(StreamState::Suspended),
            Err(e) => log::warn!("Could not suspend audio stream: {}", e),
        }
    }
}

/// Sink that records every request; handy for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub tones: Vec<Tone>,
    pub suspended: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.tones.len()
    }
}

impl ToneSink for RecordingSink {
    fn play_tone(&mut self, frequency_hz: f32, duration_s: f32, peak_gain: f32) {
        self.suspended = false;
        self.tones.push(Tone::new(frequency_hz, duration_s, peak_gain));
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }
}
