//! Core domain logic for the todo app.
//! This crate owns the todo store, the simulated resource API and the
//! client cache that keeps the UI in sync with it.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod storage;
pub mod view;

pub use api::{
    ApiError, ApiResult, LatencyPolicy, NoLatency, SimulatedTodoApi, TodoResource, UniformLatency,
};
pub use cache::{
    CacheError, CacheSnapshot, MutationPhase, Notification, NotificationLevel, TodoCache,
    MAX_NOTIFICATIONS,
};
pub use config::{AppConfig, ConfigError};
pub use logging::{
    active_settings, init_logging, init_logging_from_config, LogLevel, LogSettings, LoggingError,
};
pub use model::todo::{parse_due_date, NewTodo, Todo, TodoId, TodoPatch, TodoValidationError};
pub use model::validation::{validate_new_todo, validate_patch, ValidationError};
pub use storage::{
    MemoryStorage, PersistenceError, SqliteStorage, StorageError, StorageMedium, TodoStore,
    DEFAULT_STORAGE_KEY,
};
pub use view::{apply_query, SortDirection, SortKey, StatusFilter, TodoQuery, TodoStats};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
