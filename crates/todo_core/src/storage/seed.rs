//! Fixed starter collection written when storage is empty.

use crate::model::todo::Todo;
use chrono::{DateTime, Utc};
use uuid::Uuid;

// 2024-01-01T09:00:00Z
const SEED_BASE_EPOCH_SECS: i64 = 1_704_099_600;

/// Returns the deterministic seed set, newest first.
///
/// Covers a completed item without due date, an open item with a due date and
/// an open item without one.
pub fn seed_todos() -> Vec<Todo> {
    let mut todos = vec![
        seed_item(
            0x5eed_0000_0000_4000_8000_0000_0000_0001,
            "Explore the todo list",
            "Tick the checkbox to complete an item, or open it to edit the details.",
            None,
            true,
            0,
        ),
        seed_item(
            0x5eed_0000_0000_4000_8000_0000_0000_0002,
            "Plan the week",
            "Block time for the three most important tasks.",
            Some(7 * 24 * 60 * 60),
            false,
            5 * 60,
        ),
        seed_item(
            0x5eed_0000_0000_4000_8000_0000_0000_0003,
            "Read a chapter",
            "",
            None,
            false,
            10 * 60,
        ),
    ];
    todos.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    todos
}

fn seed_item(
    id: u128,
    title: &str,
    description: &str,
    due_offset_secs: Option<i64>,
    completed: bool,
    created_offset_secs: i64,
) -> Todo {
    let created_at = seed_time(created_offset_secs);
    Todo {
        id: Uuid::from_u128(id),
        title: title.to_string(),
        description: description.to_string(),
        due_date: due_offset_secs.map(seed_time),
        completed,
        created_at,
        updated_at: created_at,
    }
}

fn seed_time(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(SEED_BASE_EPOCH_SECS + offset_secs, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::seed_todos;
    use std::collections::HashSet;

    #[test]
    fn seed_is_deterministic_valid_and_newest_first() {
        let first = seed_todos();
        assert_eq!(first, seed_todos());
        assert_eq!(first.len(), 3);

        let ids: HashSet<_> = first.iter().map(|todo| todo.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(first.iter().all(|todo| todo.validate().is_ok()));
        assert!(first
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));

        assert!(first.iter().any(|todo| todo.completed && todo.due_date.is_none()));
        assert!(first.iter().any(|todo| !todo.completed && todo.due_date.is_some()));
        assert!(first.iter().any(|todo| !todo.completed && todo.due_date.is_none()));
    }
}
