//! Scoped key/value storage: in-memory store and JSON-snapshot persistence

mod memory;
mod persisted;

pub use memory::{MemoryStore, Snapshot};
pub use persisted::{PersistedStore, SnapshotSink};
