// Timeline - Tempo representation
// Handles BPM bounds and conversion between beats and milliseconds

use std::fmt;

/// Lowest tempo the metronome accepts
pub const MIN_BPM: u16 = 30;
/// Highest tempo the metronome accepts
pub const MAX_BPM: u16 = 240;

/// Tempo in BPM (Beats Per Minute)
/// Always within [MIN_BPM, MAX_BPM]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Tempo {
    bpm: u16,
}

impl Tempo {
    /// Creates a new tempo, clamping out-of-range values
    pub fn new(bpm: u16) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
        }
    }

    /// Creates a tempo only if `bpm` is already in range
    pub fn try_new(bpm: i64) -> Option<Self> {
        if (MIN_BPM as i64..=MAX_BPM as i64).contains(&bpm) {
            Some(Self { bpm: bpm as u16 })
        } else {
            None
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Tempo moved by `delta` BPM, clamped to the valid range
    pub fn offset(&self, delta: i32) -> Self {
        let bpm = (self.bpm as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32);
        Self { bpm: bpm as u16 }
    }

    /// Duration of one beat in milliseconds
    pub fn beat_duration_ms(&self) -> f64 {
        60_000.0 / self.bpm as f64
    }

    pub fn is_min(&self) -> bool {
        self.bpm == MIN_BPM
    }

    pub fn is_max(&self) -> bool {
        self.bpm == MAX_BPM
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120)
    }
}

impl TryFrom<u16> for Tempo {
    type Error = String;

    fn try_from(bpm: u16) -> Result<Self, Self::Error> {
        Self::try_new(bpm as i64)
            .ok_or_else(|| format!("BPM must be between {} and {}", MIN_BPM, MAX_BPM))
    }
}

impl From<Tempo> for u16 {
    fn from(tempo: Tempo) -> Self {
        tempo.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
