//! Plan document synchronization
//!
//! Edits apply locally first and persist in the background; remote changes
//! stream in over a store subscription and merge last-write-wins. The store
//! itself is pluggable: [`MemoryStore`] for tests and offline use,
//! [`FileStore`] for plans on disk.

mod engine;
mod file;
mod memory;
mod store;


pub use engine::{PERSIST_TIMEOUT, SyncEngine, SyncNotice, SyncState};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{DocumentStore, RemoteUpdate, StoreError};
