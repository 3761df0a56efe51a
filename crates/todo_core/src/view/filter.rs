//! Filtering and sorting of a cached todo collection.
//!
//! # Invariants
//! - Transforms are pure: input slices are never modified.
//! - Sorting is stable; equal keys keep cache order.
//! - Todos without a due date sort last by due date in both directions.

use crate::model::todo::Todo;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Parses `all|active|completed` (case-insensitive); anything else is `All`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "completed" | "done" => Self::Completed,
            _ => Self::All,
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// View-side query over the cached collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub status: StatusFilter,
    /// Whitespace-separated terms; every term must match title or description.
    pub search: String,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl TodoQuery {
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sort_by(mut self, sort: SortKey, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }
}

/// Returns the todos matching `query`, sorted as requested.
pub fn apply_query(todos: &[Todo], query: &TodoQuery) -> Vec<Todo> {
    let terms: Vec<String> = query
        .search
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut visible: Vec<Todo> = todos
        .iter()
        .filter(|todo| query.status.matches(todo))
        .filter(|todo| matches_terms(todo, &terms))
        .cloned()
        .collect();

    visible.sort_by(|left, right| compare(left, right, query.sort, query.direction));
    visible
}

fn matches_terms(todo: &Todo, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let title = todo.title.to_lowercase();
    let description = todo.description.to_lowercase();
    terms
        .iter()
        .all(|term| title.contains(term.as_str()) || description.contains(term.as_str()))
}

fn compare(left: &Todo, right: &Todo, key: SortKey, direction: SortDirection) -> Ordering {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match key {
        SortKey::CreatedAt => directed(left.created_at.cmp(&right.created_at)),
        SortKey::UpdatedAt => directed(left.updated_at.cmp(&right.updated_at)),
        SortKey::Title => directed(
            left.title
                .to_lowercase()
                .cmp(&right.title.to_lowercase()),
        ),
        SortKey::DueDate => match (left.due_date, right.due_date) {
            (Some(l), Some(r)) => directed(l.cmp(&r)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
