//! Input validation for todo create/patch requests.
//!
//! # Responsibility
//! - Reject malformed user input before it reaches the resource API.
//! - Return trimmed copies of accepted input.
//!
//! # Invariants
//! - A validated title is non-empty after trimming.
//! - A validated due date is blank or parseable by `parse_due_date`.

use crate::model::todo::{parse_due_date, NewTodo, TodoPatch};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Field-level input errors surfaced inline at the point of entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    DescriptionTooLong { max: usize, actual: usize },
    InvalidDueDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title must be at most {max} characters (got {actual})")
            }
            Self::DescriptionTooLong { max, actual } => write!(
                f,
                "description must be at most {max} characters (got {actual})"
            ),
            Self::InvalidDueDate(raw) => write!(f, "invalid due date `{raw}`"),
        }
    }
}

impl Error for ValidationError {}

/// Validates a create request and returns its trimmed form.
///
/// # Errors
/// - `EmptyTitle` / `TitleTooLong` for title violations.
/// - `DescriptionTooLong` when the trimmed description exceeds the limit.
/// - `InvalidDueDate` when a non-blank due date cannot be parsed.
pub fn validate_new_todo(input: &NewTodo) -> Result<NewTodo, ValidationError> {
    let title = check_title(&input.title)?;
    let description = check_description(&input.description)?;
    let due_date = match input.due_date.as_deref() {
        Some(raw) => check_due_date(raw)?,
        None => None,
    };

    Ok(NewTodo {
        title,
        description,
        due_date,
    })
}

/// Validates a patch and returns its trimmed form.
///
/// Only present fields are checked; an empty patch is valid.
pub fn validate_patch(patch: &TodoPatch) -> Result<TodoPatch, ValidationError> {
    let title = patch.title.as_deref().map(check_title).transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(check_description)
        .transpose()?;
    let due_date = match &patch.due_date {
        Some(Some(raw)) => Some(check_due_date(raw)?),
        Some(None) => Some(None),
        None => None,
    };

    Ok(TodoPatch {
        title,
        description,
        due_date,
        completed: patch.completed,
    })
}

fn check_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let actual = title.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(title.to_string())
}

fn check_description(raw: &str) -> Result<String, ValidationError> {
    let description = raw.trim();
    let actual = description.chars().count();
    if actual > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX_CHARS,
            actual,
        });
    }
    Ok(description.to_string())
}

// Blank due dates collapse to "no due date".
fn check_due_date(raw: &str) -> Result<Option<String>, ValidationError> {
    match parse_due_date(raw) {
        Ok(Some(_)) => Ok(Some(raw.trim().to_string())),
        Ok(None) => Ok(None),
        Err(raw) => Err(ValidationError::InvalidDueDate(raw)),
    }
}
