//! Summary counters for a todo collection.

use crate::model::todo::Todo;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Active todos whose due date is before `now`.
    pub overdue: usize,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo], now: DateTime<Utc>) -> Self {
        todos.iter().fold(Self::default(), |mut stats, todo| {
            stats.total += 1;
            if todo.completed {
                stats.completed += 1;
            } else {
                stats.active += 1;
            }
            if todo.is_overdue(now) {
                stats.overdue += 1;
            }
            stats
        })
    }
}
