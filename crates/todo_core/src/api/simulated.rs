//! In-process simulation of a remote todo resource.
//!
//! # Responsibility
//! - Serve list/get/create/update/toggle/delete from a `TodoStore`.
//! - Delay every call through an injectable latency policy.
//!
//! # Invariants
//! - Every call awaits its latency before touching the store.
//! - Every mutation is one full read-seed-mutate-write transaction.
//! - Reads write only when they seed an empty collection.
//! - The collection stays ordered by `created_at` descending.

use crate::api::latency::LatencyPolicy;
use crate::api::resource::{ApiError, ApiResult, TodoResource};
use crate::config::AppConfig;
use crate::model::todo::{parse_due_date, NewTodo, Todo, TodoId, TodoPatch};
use crate::storage::TodoStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Simulated resource API backed by the store shim.
#[derive(Clone)]
pub struct SimulatedTodoApi {
    store: Arc<TodoStore>,
    latency: Arc<dyn LatencyPolicy>,
}

impl SimulatedTodoApi {
    pub fn new(store: Arc<TodoStore>, latency: Arc<dyn LatencyPolicy>) -> Self {
        Self { store, latency }
    }

    /// Opens the configured store and applies the configured latency bounds.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(TodoStore::open(config)),
            Arc::new(config.latency_policy()),
        )
    }

    pub fn store(&self) -> &Arc<TodoStore> {
        &self.store
    }

    async fn simulate_latency(&self) {
        tokio::time::sleep(self.latency.next_delay()).await;
    }

    /// Runs `apply` inside one store transaction.
    fn mutate<T>(
        &self,
        op: &'static str,
        id: Option<TodoId>,
        apply: impl FnOnce(&mut Vec<Todo>) -> ApiResult<T>,
    ) -> ApiResult<T> {
        self.logged(op, id, || self.store.transact(apply))
    }

    /// Runs `read` over an owned copy; nothing is written back.
    fn query<T>(
        &self,
        op: &'static str,
        id: Option<TodoId>,
        read: impl FnOnce(Vec<Todo>) -> ApiResult<T>,
    ) -> ApiResult<T> {
        self.logged(op, id, || read(self.store.read_seeded()))
    }

    fn logged<T>(
        &self,
        op: &'static str,
        id: Option<TodoId>,
        call: impl FnOnce() -> ApiResult<T>,
    ) -> ApiResult<T> {
        let started_at = Instant::now();
        let result = call();
        let id_label = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        match &result {
            Ok(_) => info!(
                "event=todo_{op} module=api status=ok todo_id={id_label} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=todo_{op} module=api status=error todo_id={id_label} error={err}"
            ),
        }
        result
    }
}

#[async_trait]
impl TodoResource for SimulatedTodoApi {
    async fn list(&self) -> ApiResult<Vec<Todo>> {
        self.simulate_latency().await;
        self.query("list", None, |mut todos| {
            sort_newest_first(&mut todos);
            Ok(todos)
        })
    }

    async fn get(&self, id: TodoId) -> ApiResult<Todo> {
        self.simulate_latency().await;
        self.query("get", Some(id), |todos| {
            todos
                .into_iter()
                .find(|todo| todo.id == id)
                .ok_or(ApiError::NotFound(id))
        })
    }

    async fn create(&self, input: NewTodo) -> ApiResult<Todo> {
        self.simulate_latency().await;
        let mut created = Todo::new(
            input.title.trim(),
            input.description.trim(),
            lenient_due_date(input.due_date.as_deref()),
            Utc::now(),
        );
        self.mutate("create", Some(created.id), move |todos| {
            while todos.iter().any(|todo| todo.id == created.id) {
                created.id = Uuid::new_v4();
            }
            todos.insert(0, created.clone());
            sort_newest_first(todos);
            Ok(created)
        })
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> ApiResult<Todo> {
        self.simulate_latency().await;
        self.mutate("update", Some(id), move |todos| {
            let todo = find_mut(todos, id)?;
            if let Some(title) = patch.title {
                todo.title = title.trim().to_string();
            }
            if let Some(description) = patch.description {
                todo.description = description.trim().to_string();
            }
            if let Some(due_date) = patch.due_date {
                todo.due_date = lenient_due_date(due_date.as_deref());
            }
            if let Some(completed) = patch.completed {
                todo.completed = completed;
            }
            todo.touch(Utc::now());
            Ok(todo.clone())
        })
    }

    async fn toggle_completion(&self, id: TodoId) -> ApiResult<Todo> {
        self.simulate_latency().await;
        self.mutate("toggle", Some(id), |todos| {
            let todo = find_mut(todos, id)?;
            todo.completed = !todo.completed;
            todo.touch(Utc::now());
            Ok(todo.clone())
        })
    }

    async fn delete(&self, id: TodoId) -> ApiResult<()> {
        self.simulate_latency().await;
        self.mutate("delete", Some(id), |todos| {
            let index = todos
                .iter()
                .position(|todo| todo.id == id)
                .ok_or(ApiError::NotFound(id))?;
            todos.remove(index);
            Ok(())
        })
    }
}

fn find_mut(todos: &mut [Todo], id: TodoId) -> ApiResult<&mut Todo> {
    todos
        .iter_mut()
        .find(|todo| todo.id == id)
        .ok_or(ApiError::NotFound(id))
}

/// Orders todos by `created_at` descending; ties keep their relative order.
pub fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}

// Input reaching the API is trusted; anything unparsable is dropped.
fn lenient_due_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    match parse_due_date(raw?) {
        Ok(parsed) => parsed,
        Err(rejected) => {
            warn!(
                "event=due_date_normalize module=api status=ignored input_chars={}",
                rejected.chars().count()
            );
            None
        }
    }
}
