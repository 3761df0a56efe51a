//! Key-value storage media behind the todo store.
//!
//! # Responsibility
//! - Define the `StorageMedium` contract (a namespaced string key-value store).
//! - Provide a SQLite-backed durable medium and a shared in-memory medium.
//!
//! # Invariants
//! - Values are opaque strings; the medium never interprets them.
//! - `set_item` replaces any previous value for the key.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a storage medium.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String key-value medium with local-storage semantics.
pub trait StorageMedium: Send {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Durable medium stored in the `local_storage` table.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }
}

impl StorageMedium for SqliteStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory medium whose clones share one map.
///
/// Marking it unavailable makes every call fail, which models hosts where
/// local storage is disabled.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory medium disabled".to_string(),
            ));
        }
        Ok(())
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageMedium for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_available()?;
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_available()?;
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
