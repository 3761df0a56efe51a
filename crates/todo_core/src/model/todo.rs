//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record persisted by the store shim.
//! - Define create/patch request shapes consumed by the resource API.
//! - Normalize user-entered due dates into canonical UTC timestamps.
//!
//! # Invariants
//! - `id` is stable and never reused for another todo.
//! - `updated_at` is never earlier than `created_at`.
//! - Wire field names are camelCase and match the durable layout.
//!
//! # See also
//! - crate::storage for the durable layout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a todo item.
pub type TodoId = Uuid;

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Absent due date serializes as `null`.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invariant violations detected on a persisted todo record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    NilId,
    EmptyTitle(TodoId),
    UpdatedBeforeCreated {
        id: TodoId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "todo id must not be nil"),
            Self::EmptyTitle(id) => write!(f, "todo {id} has an empty title"),
            Self::UpdatedBeforeCreated {
                id,
                created_at,
                updated_at,
            } => write!(
                f,
                "todo {id} updatedAt ({updated_at}) must be >= createdAt ({created_at})"
            ),
        }
    }
}

impl Error for TodoValidationError {}

impl Todo {
    /// Creates a fresh todo with a generated id.
    ///
    /// # Invariants
    /// - `created_at == updated_at == now`.
    /// - `completed` starts as `false`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            due_date,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes `updated_at`, clamped so it never precedes `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Checks persisted-record invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::EmptyTitle(self.id));
        }
        if self.updated_at < self.created_at {
            return Err(TodoValidationError::UpdatedBeforeCreated {
                id: self.id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Returns whether the todo is incomplete and its due date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Request model for creating a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 date-time or `YYYY-MM-DD`; empty means no due date.
    #[serde(default)]
    pub due_date: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Partial update request.
///
/// A field is applied if and only if it is present (`Some`). `due_date` is
/// double-optional: `Some(None)` clears the due date, `None` leaves it as is.
/// Deserialized from JSON, an explicit `"dueDate": null` is present-and-null
/// while a missing key is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(Some(due_date.into()));
        self
    }

    pub fn clear_due_date(mut self) -> Self {
        self.due_date = Some(None);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Returns whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Parses a user-entered due date.
///
/// Accepts RFC 3339 date-times (converted to UTC) and `YYYY-MM-DD` calendar
/// dates (midnight UTC). Blank input yields `Ok(None)`.
///
/// # Errors
/// - Returns the trimmed raw input when it matches neither shape.
pub fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| trimmed.to_string())
}
