// Trial gating - Session counting and upgrade flag

pub mod gate;
pub mod store;

pub use gate::SessionGate;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
