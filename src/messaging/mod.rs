// Messaging - Lock-free UI → audio commands

pub mod channels;
pub mod command;
