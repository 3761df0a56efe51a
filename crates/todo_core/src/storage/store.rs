//! Todo store shim over a key-value medium.
//!
//! # Responsibility
//! - Own the canonical todo collection.
//! - Persist the whole collection as one JSON array under a namespaced key.
//! - Keep an in-process copy used when the medium is missing or corrupt.
//!
//! # Invariants
//! - Callers only ever receive owned copies; stored data is never aliased.
//! - Medium failures are logged and never surface to callers.
//! - `transact` runs read-seed-mutate-write under one lock.

use crate::config::AppConfig;
use crate::model::todo::{Todo, TodoId, TodoValidationError};
use crate::storage::medium::{SqliteStorage, StorageError, StorageMedium};
use crate::storage::seed::seed_todos;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Namespaced key holding the serialized collection.
pub const DEFAULT_STORAGE_KEY: &str = "todo-app:todos";

/// Why a persisted collection could not be used.
#[derive(Debug)]
pub enum PersistenceError {
    Medium(StorageError),
    Parse(serde_json::Error),
    Invalid(TodoValidationError),
    DuplicateId(TodoId),
}

impl PersistenceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Medium(_) => "medium_unavailable",
            Self::Parse(_) | Self::Invalid(_) | Self::DuplicateId(_) => "persistence_parse_error",
        }
    }
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medium(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "unparsable todo collection: {err}"),
            Self::Invalid(err) => write!(f, "invalid persisted todo: {err}"),
            Self::DuplicateId(id) => write!(f, "duplicate persisted todo id: {id}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Medium(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Medium(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<TodoValidationError> for PersistenceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Invalid(value)
    }
}

struct StoreState {
    medium: Option<Box<dyn StorageMedium>>,
    fallback: Vec<Todo>,
}

/// Owner of the canonical todo collection.
pub struct TodoStore {
    key: String,
    state: Mutex<StoreState>,
}

impl TodoStore {
    /// Creates a store persisting through `medium` under `key`.
    pub fn new(medium: Box<dyn StorageMedium>, key: impl Into<String>) -> Self {
        Self::with_medium(Some(medium), key.into())
    }

    /// Creates a non-durable store (degraded mode).
    pub fn in_memory() -> Self {
        Self::with_medium(None, DEFAULT_STORAGE_KEY.to_string())
    }

    /// Opens the store described by `config`.
    ///
    /// Falls back to degraded mode when no path is configured or the database
    /// cannot be opened.
    pub fn open(config: &AppConfig) -> Self {
        let Some(path) = config.db_path.as_ref() else {
            info!("event=store_open module=storage status=ok mode=memory");
            return Self::with_medium(None, config.storage_key.clone());
        };

        match SqliteStorage::open(path) {
            Ok(medium) => {
                info!("event=store_open module=storage status=ok mode=sqlite");
                Self::new(Box::new(medium), config.storage_key.clone())
            }
            Err(err) => {
                warn!(
                    "event=store_open module=storage status=degraded mode=memory error_code=medium_unavailable error={err}"
                );
                Self::with_medium(None, config.storage_key.clone())
            }
        }
    }

    fn with_medium(medium: Option<Box<dyn StorageMedium>>, key: String) -> Self {
        Self {
            key,
            state: Mutex::new(StoreState {
                medium,
                fallback: Vec::new(),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns whether writes reach a durable medium.
    pub fn is_durable(&self) -> bool {
        self.lock().medium.is_some()
    }

    /// Returns an owned copy of the persisted collection.
    ///
    /// Falls back to the last in-process copy when the medium is unavailable,
    /// empty, or holds unusable data.
    pub fn read(&self) -> Vec<Todo> {
        self.lock().read(&self.key)
    }

    /// Replaces the persisted collection with a copy of `todos`.
    pub fn write(&self, todos: &[Todo]) {
        self.lock().write(&self.key, todos);
    }

    /// Replaces an empty collection with the seed set and persists it.
    ///
    /// Non-empty input is returned unchanged, so repeated calls never re-seed.
    pub fn ensure_seed(&self, todos: Vec<Todo>) -> Vec<Todo> {
        self.lock().ensure_seed(&self.key, todos)
    }

    /// Reads the collection, seeding it first when empty.
    ///
    /// Only the seeding path writes; a non-empty collection (including one
    /// served from the fallback copy) leaves the medium untouched.
    pub fn read_seeded(&self) -> Vec<Todo> {
        let mut state = self.lock();
        let current = state.read(&self.key);
        state.ensure_seed(&self.key, current)
    }

    /// Runs one atomic read-modify-write over the collection.
    ///
    /// The collection is seeded when empty before `mutate` runs. It is only
    /// written back when `mutate` succeeds.
    pub fn transact<T, E>(
        &self,
        mutate: impl FnOnce(&mut Vec<Todo>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut state = self.lock();
        let current = state.read(&self.key);
        let mut todos = state.ensure_seed(&self.key, current);
        let output = mutate(&mut todos)?;
        state.write(&self.key, &todos);
        Ok(output)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StoreState {
    fn read(&mut self, key: &str) -> Vec<Todo> {
        let Some(medium) = self.medium.as_ref() else {
            return self.fallback.clone();
        };

        match load_collection(medium.as_ref(), key) {
            Ok(Some(todos)) => {
                self.fallback = todos.clone();
                todos
            }
            Ok(None) => self.fallback.clone(),
            Err(err) => {
                warn!(
                    "event=store_read module=storage status=fallback error_code={} error={err}",
                    err.code()
                );
                self.fallback.clone()
            }
        }
    }

    fn write(&mut self, key: &str, todos: &[Todo]) {
        self.fallback = todos.to_vec();

        let Some(medium) = self.medium.as_ref() else {
            return;
        };
        let result = serde_json::to_string(todos)
            .map_err(PersistenceError::from)
            .and_then(|raw| medium.set_item(key, &raw).map_err(PersistenceError::from));
        match result {
            Ok(()) => debug!(
                "event=store_write module=storage status=ok count={}",
                todos.len()
            ),
            Err(err) => warn!(
                "event=store_write module=storage status=fallback error_code={} error={err}",
                err.code()
            ),
        }
    }

    fn ensure_seed(&mut self, key: &str, todos: Vec<Todo>) -> Vec<Todo> {
        if !todos.is_empty() {
            return todos;
        }
        let seeded = seed_todos();
        self.write(key, &seeded);
        info!(
            "event=store_seed module=storage status=ok count={}",
            seeded.len()
        );
        seeded
    }
}

fn load_collection(
    medium: &dyn StorageMedium,
    key: &str,
) -> Result<Option<Vec<Todo>>, PersistenceError> {
    let Some(raw) = medium.get_item(key)? else {
        return Ok(None);
    };

    let todos: Vec<Todo> = serde_json::from_str(&raw)?;
    let mut seen = HashSet::with_capacity(todos.len());
    for todo in &todos {
        todo.validate()?;
        if !seen.insert(todo.id) {
            return Err(PersistenceError::DuplicateId(todo.id));
        }
    }
    Ok(Some(todos))
}

#[cfg(test)]
mod tests {
    use super::{TodoStore, DEFAULT_STORAGE_KEY};
    use crate::model::todo::Todo;
    use crate::storage::medium::{MemoryStorage, StorageMedium};
    use chrono::Utc;

    #[test]
    fn transact_does_not_write_when_mutation_fails() {
        let medium = MemoryStorage::new();
        let store = TodoStore::new(Box::new(medium.clone()), DEFAULT_STORAGE_KEY);
        let seeded = store.ensure_seed(Vec::new());

        let result: Result<(), &str> = store.transact(|todos| {
            todos.clear();
            Err("abort")
        });
        assert_eq!(result, Err("abort"));
        assert_eq!(store.read(), seeded);
    }

    #[test]
    fn read_ignores_records_that_break_invariants() {
        let medium = MemoryStorage::new();
        let store = TodoStore::new(Box::new(medium.clone()), DEFAULT_STORAGE_KEY);
        let todo = Todo::new("kept", "", None, Utc::now());
        store.write(std::slice::from_ref(&todo));

        let mut broken = todo.clone();
        broken.updated_at = broken.created_at - chrono::Duration::seconds(1);
        let raw = serde_json::to_string(&vec![broken]).unwrap();
        medium.set_item(DEFAULT_STORAGE_KEY, &raw).unwrap();

        assert_eq!(store.read(), vec![todo]);
    }

    #[test]
    fn degraded_store_keeps_writes_in_process() {
        let store = TodoStore::in_memory();
        assert!(!store.is_durable());

        let todo = Todo::new("offline", "", None, Utc::now());
        store.write(std::slice::from_ref(&todo));
        assert_eq!(store.read(), vec![todo]);
    }
}
