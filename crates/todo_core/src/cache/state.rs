//! Observable cache state, notifications and mutation phases.

use crate::api::resource::ApiError;
use crate::model::todo::{Todo, TodoId};
use crate::model::validation::ValidationError;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure returned by cache actions and recorded for failed queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Input rejected before reaching the resource.
    Validation(ValidationError),
    /// Resource call rejected.
    Resource(ApiError),
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Resource(ApiError::NotFound(_)))
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Resource(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Resource(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CacheError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ApiError> for CacheError {
    fn from(value: ApiError) -> Self {
        Self::Resource(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Most notifications kept in a snapshot; older ones are dropped first.
pub const MAX_NOTIFICATIONS: usize = 20;

/// Dismissible user-facing message raised by a settled mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of one mutation issued through the cache.
///
/// `Issued -> OptimisticApplied -> (SettledSuccess | SettledFailure) -> Final`.
/// Confirm-then-apply mutations skip `OptimisticApplied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Issued,
    OptimisticApplied,
    SettledSuccess,
    SettledFailure,
    Final,
}

impl MutationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::OptimisticApplied => "optimistic_applied",
            Self::SettledSuccess => "settled_success",
            Self::SettledFailure => "settled_failure",
            Self::Final => "final",
        }
    }
}

/// Point-in-time view of the cache handed to the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Last known collection, newest first.
    pub todos: Vec<Todo>,
    /// True while the first fetch has not completed.
    pub is_loading: bool,
    /// True while any fetch is in flight.
    pub is_fetching: bool,
    /// Last query failure; cleared by a successful fetch.
    pub error: Option<CacheError>,
    pub notifications: Vec<Notification>,
    /// Mutations issued but not yet settled.
    pub pending_mutations: usize,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn find(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Replaces the entry with the same id; unknown ids are ignored.
    pub(crate) fn merge(&mut self, canonical: &Todo) {
        if let Some(slot) = self.todos.iter_mut().find(|todo| todo.id == canonical.id) {
            *slot = canonical.clone();
        }
    }

    /// Inserts or replaces by id, keeping newest-first order.
    pub(crate) fn upsert(&mut self, canonical: &Todo) {
        match self.todos.iter_mut().find(|todo| todo.id == canonical.id) {
            Some(slot) => *slot = canonical.clone(),
            None => self.todos.insert(0, canonical.clone()),
        }
        crate::api::sort_newest_first(&mut self.todos);
    }

    pub(crate) fn remove(&mut self, id: TodoId) {
        self.todos.retain(|todo| todo.id != id);
    }

    /// Appends a notification, dropping the oldest beyond `MAX_NOTIFICATIONS`.
    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
        let overflow = self.notifications.len().saturating_sub(MAX_NOTIFICATIONS);
        self.notifications.drain(..overflow);
    }
}
