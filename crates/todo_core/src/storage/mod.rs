//! Persistent store shim for the todo collection.
//!
//! # Responsibility
//! - Hold the canonical collection and mirror it into a key-value medium.
//! - Seed an empty collection with a fixed starter set.
//!
//! # Invariants
//! - The whole collection is persisted on every write; there is no
//!   incremental persistence or transaction log.
//! - A missing or corrupt medium degrades to the in-process copy.

pub mod medium;
pub mod seed;
pub mod store;

pub use medium::{MemoryStorage, SqliteStorage, StorageError, StorageMedium, StorageResult};
pub use seed::seed_todos;
pub use store::{PersistenceError, TodoStore, DEFAULT_STORAGE_KEY};
