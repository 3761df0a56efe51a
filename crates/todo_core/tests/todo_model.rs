use chrono::{TimeZone, Utc};
use todo_core::{NewTodo, Todo, TodoPatch, TodoValidationError};
use uuid::Uuid;

#[test]
fn todo_new_sets_defaults() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();
    let todo = Todo::new("Buy milk", "", None, now);

    assert!(!todo.id.is_nil());
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.description, "");
    assert_eq!(todo.due_date, None);
    assert!(!todo.completed);
    assert_eq!(todo.created_at, now);
    assert_eq!(todo.updated_at, now);
    assert!(todo.validate().is_ok());
}

#[test]
fn todo_serialization_uses_camel_case_wire_fields() {
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();
    let due = Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap();
    let mut todo = Todo::new("Ship release", "tag and publish", Some(due), now);
    todo.id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();

    let json = serde_json::to_value(&todo).unwrap();
    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["title"], "Ship release");
    assert_eq!(json["description"], "tag and publish");
    assert_eq!(json["dueDate"], "2025-01-12T00:00:00Z");
    assert_eq!(json["completed"], false);
    assert_eq!(json["createdAt"], "2025-01-10T09:30:00Z");
    assert_eq!(json["updatedAt"], "2025-01-10T09:30:00Z");

    let decoded: Todo = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, todo);
}

#[test]
fn absent_due_date_serializes_as_null() {
    let todo = Todo::new("no deadline", "", None, Utc::now());
    let json = serde_json::to_value(&todo).unwrap();
    assert!(json["dueDate"].is_null());
}

#[test]
fn validate_rejects_nil_id_blank_title_and_reversed_timestamps() {
    let now = Utc::now();
    let mut todo = Todo::new("valid", "", None, now);

    todo.id = Uuid::nil();
    assert_eq!(todo.validate().unwrap_err(), TodoValidationError::NilId);

    todo.id = Uuid::new_v4();
    todo.title = "   ".to_string();
    assert!(matches!(
        todo.validate().unwrap_err(),
        TodoValidationError::EmptyTitle(_)
    ));

    todo.title = "valid".to_string();
    todo.updated_at = now - chrono::Duration::seconds(1);
    assert!(matches!(
        todo.validate().unwrap_err(),
        TodoValidationError::UpdatedBeforeCreated { .. }
    ));
}

#[test]
fn patch_distinguishes_missing_and_null_due_date() {
    let missing: TodoPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
    assert_eq!(missing.due_date, None);
    assert_eq!(missing.title.as_deref(), Some("x"));

    let cleared: TodoPatch = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
    assert_eq!(cleared.due_date, Some(None));
    assert!(!cleared.is_empty());

    let set: TodoPatch = serde_json::from_str(r#"{"dueDate": "2025-02-01"}"#).unwrap();
    assert_eq!(set.due_date, Some(Some("2025-02-01".to_string())));

    let empty: TodoPatch = serde_json::from_str("{}").unwrap();
    assert!(empty.is_empty());
}

#[test]
fn patch_serialization_keeps_explicit_null_and_skips_absent_fields() {
    let json = serde_json::to_value(TodoPatch::default().clear_due_date()).unwrap();
    assert_eq!(json, serde_json::json!({ "dueDate": null }));

    let json = serde_json::to_value(TodoPatch::default().completed(true)).unwrap();
    assert_eq!(json, serde_json::json!({ "completed": true }));
}

#[test]
fn new_todo_deserializes_with_optional_fields() {
    let input: NewTodo = serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();
    assert_eq!(input, NewTodo::new("Buy milk"));
}
