//! Remote todo resource contract.
//!
//! # Responsibility
//! - Define the async CRUD surface the cache layer talks to.
//! - Define resource-level failures.
//!
//! # Invariants
//! - Successful calls return canonical items, never caller-owned state.

use crate::model::todo::{NewTodo, Todo, TodoId, TodoPatch};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound(TodoId),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
        }
    }
}

impl Error for ApiError {}

/// Async CRUD surface over the todo collection.
#[async_trait]
pub trait TodoResource: Send + Sync {
    /// Lists all todos, newest first.
    async fn list(&self) -> ApiResult<Vec<Todo>>;
    async fn get(&self, id: TodoId) -> ApiResult<Todo>;
    /// Creates a todo. Input is expected to be validated upstream.
    async fn create(&self, input: NewTodo) -> ApiResult<Todo>;
    /// Applies present patch fields only.
    async fn update(&self, id: TodoId, patch: TodoPatch) -> ApiResult<Todo>;
    async fn toggle_completion(&self, id: TodoId) -> ApiResult<Todo>;
    async fn delete(&self, id: TodoId) -> ApiResult<()>;
}
