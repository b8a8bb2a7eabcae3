// Command types - UI → Audio communication

use crate::audio::click::Tone;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    PlayTone(Tone),
    /// Cut any ringing click
    Silence,
}
