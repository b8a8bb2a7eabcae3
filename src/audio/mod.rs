// Audio module - cpal backend and the real-time click voice

pub mod click;
pub mod engine;
pub mod status;
