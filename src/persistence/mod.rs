//! Persistence Module
//!
//! Optional durable snapshots of a cache, restored on startup when fresh.

mod adapter;
mod snapshot;
mod storage;

pub use adapter::PersistenceAdapter;
pub use snapshot::Snapshot;
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
