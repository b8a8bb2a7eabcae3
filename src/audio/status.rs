// Output stream state shared with the cpal error callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Running = 0,
    /// Paused while the metronome is stopped; resumed before the next tone
    Suspended = 1,
    Failed = 2,
}

impl From<u8> for StreamState {
    fn from(value: u8) -> Self {
        match value {
            0 => StreamState::Running,
            1 => StreamState::Suspended,
            _ => StreamState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AtomicStreamState {
    inner: Arc<AtomicU8>,
}

impl AtomicStreamState {
    pub fn new(state: StreamState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state as u8)),
        }
    }

    pub fn get(&self) -> StreamState {
        StreamState::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, state: StreamState) {
        self.inner.store(state as u8, Ordering::Relaxed);
    }
}
