//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the todo cache (state + actions) to Dart via FRB.
//! - Convert core types into flat, string-based envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every action returns an envelope with `ok` and a human-readable message.
//! - One process-wide runtime and cache, built lazily from `TODO_APP_*` env.

use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};
use todo_core::{
    apply_query, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, AppConfig, CacheError, NewTodo, Notification, NotificationLevel,
    SimulatedTodoApi, StatusFilter, Todo, TodoCache, TodoId, TodoPatch, TodoQuery, TodoStats,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

struct Bridge {
    runtime: Runtime,
    cache: TodoCache<SimulatedTodoApi>,
}

static BRIDGE: OnceLock<Result<Bridge, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Flat todo shape for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// RFC 3339 UTC timestamp, or `None`.
    pub due_date: Option<String>,
    pub completed: bool,
    pub overdue: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// List envelope carrying the filtered items and header counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub overdue: u32,
    pub is_fetching: bool,
    pub message: String,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    pub item: Option<TodoItem>,
    /// True when the failure was caught by input validation.
    pub invalid_input: bool,
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, item: Option<TodoItem>) -> Self {
        Self {
            ok: true,
            item,
            invalid_input: false,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item: None,
            invalid_input: false,
            message: message.into(),
        }
    }

    fn from_error(action: &str, err: &CacheError) -> Self {
        Self {
            ok: false,
            item: None,
            invalid_input: matches!(err, CacheError::Validation(_)),
            message: format!("{action} failed: {err}"),
        }
    }
}

/// Dismissible message raised by a settled mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoNotice {
    pub id: u64,
    /// `success` or `error`.
    pub level: String,
    pub message: String,
}

/// Lists cached todos, loading them on first use.
///
/// Input semantics:
/// - `status`: `all|active|completed`; unknown values mean `all`.
/// - `search`: whitespace-separated terms matched against title/description.
///
/// # FFI contract
/// - Blocks on the simulated latency only for the first load.
/// - Never panics.
pub fn todo_list(status: String, search: String) -> TodoListResponse {
    let bridge = match bridge() {
        Ok(bridge) => bridge,
        Err(err) => return list_failure(err),
    };

    if bridge.cache.snapshot().last_synced_at.is_none() {
        if let Err(err) = bridge.runtime.block_on(bridge.cache.refresh()) {
            return list_failure(format!("todo_list failed: {err}"));
        }
    }

    let snapshot = bridge.cache.snapshot();
    let now = Utc::now();
    let query = TodoQuery::default()
        .status(StatusFilter::parse(&status))
        .search(search);
    let items = apply_query(&snapshot.todos, &query)
        .iter()
        .map(|todo| to_todo_item(todo, now))
        .collect::<Vec<_>>();
    let stats = TodoStats::from_todos(&snapshot.todos, now);
    let message = if items.is_empty() {
        "No todos.".to_string()
    } else {
        format!("Showing {} todo(s).", items.len())
    };

    TodoListResponse {
        ok: true,
        items,
        total: count(stats.total),
        active: count(stats.active),
        completed: count(stats.completed),
        overdue: count(stats.overdue),
        is_fetching: snapshot.is_fetching,
        message,
    }
}

/// Fetches one todo by id.
pub fn todo_get(id: String) -> TodoActionResponse {
    with_cache("todo_get", &id, |bridge, todo_id| {
        bridge
            .runtime
            .block_on(bridge.cache.get(todo_id))
            .map(|todo| {
                TodoActionResponse::success("Todo loaded.", Some(to_todo_item(&todo, Utc::now())))
            })
    })
}

/// Creates a todo from form input.
///
/// `due_date` accepts `YYYY-MM-DD` or RFC 3339; empty means no due date.
pub fn todo_create(
    title: String,
    description: String,
    due_date: Option<String>,
) -> TodoActionResponse {
    let bridge = match bridge() {
        Ok(bridge) => bridge,
        Err(err) => return TodoActionResponse::failure(err),
    };
    let input = NewTodo {
        title,
        description,
        due_date,
    };
    match bridge.runtime.block_on(bridge.cache.create(input)) {
        Ok(todo) => {
            TodoActionResponse::success("Todo created.", Some(to_todo_item(&todo, Utc::now())))
        }
        Err(err) => TodoActionResponse::from_error("todo_create", &err),
    }
}

/// Applies a partial update.
///
/// `None` leaves a field untouched. `clear_due_date = true` removes the due
/// date and takes precedence over `due_date`.
pub fn todo_update(
    id: String,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    clear_due_date: bool,
) -> TodoActionResponse {
    let patch = TodoPatch {
        title,
        description,
        due_date: if clear_due_date {
            Some(None)
        } else {
            due_date.map(Some)
        },
        completed: None,
    };
    with_cache("todo_update", &id, |bridge, todo_id| {
        bridge
            .runtime
            .block_on(bridge.cache.update(todo_id, patch))
            .map(|todo| {
                TodoActionResponse::success("Todo updated.", Some(to_todo_item(&todo, Utc::now())))
            })
    })
}

/// Toggles completion with an optimistic cache update.
pub fn todo_toggle(id: String) -> TodoActionResponse {
    with_cache("todo_toggle", &id, |bridge, todo_id| {
        bridge
            .runtime
            .block_on(bridge.cache.toggle_completion(todo_id))
            .map(|todo| {
                let message = if todo.completed {
                    "Todo completed."
                } else {
                    "Todo reopened."
                };
                TodoActionResponse::success(message, Some(to_todo_item(&todo, Utc::now())))
            })
    })
}

/// Deletes a todo permanently.
pub fn todo_delete(id: String) -> TodoActionResponse {
    with_cache("todo_delete", &id, |bridge, todo_id| {
        bridge
            .runtime
            .block_on(bridge.cache.delete(todo_id))
            .map(|()| TodoActionResponse::success("Todo deleted.", None))
    })
}

/// Returns pending notifications, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_notifications() -> Vec<TodoNotice> {
    match bridge() {
        Ok(bridge) => bridge
            .cache
            .snapshot()
            .notifications
            .iter()
            .map(to_notice)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Dismisses one notification. Returns `false` if it was already gone.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_dismiss_notification(id: u64) -> bool {
    bridge().is_ok_and(|bridge| bridge.cache.dismiss_notification(id))
}

fn bridge() -> Result<&'static Bridge, String> {
    BRIDGE
        .get_or_init(|| {
            let config =
                AppConfig::from_env().map_err(|err| format!("config load failed: {err}"))?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| format!("runtime start failed: {err}"))?;
            let cache = TodoCache::new(Arc::new(SimulatedTodoApi::from_config(&config)));
            log::info!("event=bridge_init module=ffi status=ok");
            Ok(Bridge { runtime, cache })
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn with_cache(
    action: &str,
    raw_id: &str,
    f: impl FnOnce(&Bridge, TodoId) -> Result<TodoActionResponse, CacheError>,
) -> TodoActionResponse {
    let bridge = match bridge() {
        Ok(bridge) => bridge,
        Err(err) => return TodoActionResponse::failure(err),
    };
    let todo_id = match Uuid::parse_str(raw_id.trim()) {
        Ok(todo_id) => todo_id,
        Err(_) => {
            return TodoActionResponse::failure(format!("{action} failed: invalid id `{raw_id}`"))
        }
    };
    f(bridge, todo_id).unwrap_or_else(|err| TodoActionResponse::from_error(action, &err))
}

fn list_failure(message: String) -> TodoListResponse {
    TodoListResponse {
        ok: false,
        items: Vec::new(),
        total: 0,
        active: 0,
        completed: 0,
        overdue: 0,
        is_fetching: false,
        message,
    }
}

fn to_todo_item(todo: &Todo, now: DateTime<Utc>) -> TodoItem {
    TodoItem {
        id: todo.id.to_string(),
        title: todo.title.clone(),
        description: todo.description.clone(),
        due_date: todo.due_date.map(|due| due.to_rfc3339()),
        completed: todo.completed,
        overdue: todo.is_overdue(now),
        created_at: todo.created_at.to_rfc3339(),
        updated_at: todo.updated_at.to_rfc3339(),
    }
}

fn to_notice(notification: &Notification) -> TodoNotice {
    TodoNotice {
        id: notification.id,
        level: match notification.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        }
        .to_string(),
        message: notification.message.clone(),
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
