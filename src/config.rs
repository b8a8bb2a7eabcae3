// Configuration - Runtime settings loaded from a RON file

use crate::sequencer::metronome::Variant;
use crate::sequencer::slowdown::DEFAULT_SLOWDOWN_STEP;
use crate::sequencer::timeline::Tempo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Click sound sent to the audio collaborator on every beat and tap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub frequency_hz: f32,
    pub duration_s: f32,
    pub peak_gain: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 220.0,
            duration_s: 0.1,
            peak_gain: 0.5,
        }
    }
}

/// Trial gating policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Sessions allowed before the trial counts as expired
    pub session_limit: u32,
    /// Seconds of play per session once expired, before the slowdown starts
    pub trial_seconds: u32,
    /// BPM removed per revolution during the slowdown
    pub slowdown_step: u16,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            session_limit: 5,
            trial_seconds: 10,
            slowdown_step: DEFAULT_SLOWDOWN_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub initial_bpm: Tempo,
    pub variant: Variant,
    /// Largest swing of the pendulum arm, in degrees
    pub pendulum_max_angle: f64,
    pub click: ClickConfig,
    pub trial: TrialConfig,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            initial_bpm: Tempo::default(),
            variant: Variant::Circular,
            pendulum_max_angle: 30.0,
            click: ClickConfig::default(),
            trial: TrialConfig::default(),
        }
    }
}

impl MetronomeConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..90.0).contains(&self.pendulum_max_angle) || self.pendulum_max_angle == 0.0 {
            return Err(ConfigError::Invalid(
                "Pendulum angle must be between 0 and 90 degrees".to_string(),
            ));
        }
        if self.click.frequency_hz <= 0.0 || self.click.duration_s <= 0.0 {
            return Err(ConfigError::Invalid(
                "Click frequency and duration must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.click.peak_gain) {
            return Err(ConfigError::Invalid(
                "Click gain must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.trial.slowdown_step == 0 {
            return Err(ConfigError::Invalid(
                "Slowdown step must be at least 1 BPM".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/mymusic_metronome/config.ron`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mymusic_metronome").join("config.ron"))
}
