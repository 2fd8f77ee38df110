//! Storage collaborators for the wallet ledger

pub mod kv;
pub mod persistence;

pub use kv::{KvStore, MemoryStore};
pub use persistence::{JsonFileStore, StorageError};
