// UI module - egui front-end and the phase-to-geometry mapping it draws with

pub mod app;
pub mod visual;
