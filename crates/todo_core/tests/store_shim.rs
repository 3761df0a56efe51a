use chrono::Utc;
use rusqlite::Connection;
use todo_core::db::migrations::{latest_version, schema_version};
use todo_core::db::{open_db, open_db_in_memory, DbError};
use todo_core::storage::seed_todos;
use todo_core::{
    AppConfig, MemoryStorage, SqliteStorage, StorageMedium, Todo, TodoStore, DEFAULT_STORAGE_KEY,
};

fn memory_store() -> (TodoStore, MemoryStorage) {
    let medium = MemoryStorage::new();
    let store = TodoStore::new(Box::new(medium.clone()), DEFAULT_STORAGE_KEY);
    (store, medium)
}

fn sample_todos() -> Vec<Todo> {
    let now = Utc::now();
    let mut done = Todo::new("done", "finished item", None, now);
    done.completed = true;
    vec![
        Todo::new("open", "", Some(now + chrono::Duration::days(2)), now),
        done,
    ]
}

#[test]
fn write_then_read_roundtrips_field_for_field() {
    let (store, medium) = memory_store();
    let todos = sample_todos();

    store.write(&todos);
    assert_eq!(store.read(), todos);

    let raw = medium.get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let decoded: Vec<Todo> = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded, todos);
}

#[test]
fn mutating_returned_copy_does_not_affect_later_reads() {
    let (store, _medium) = memory_store();
    let todos = sample_todos();
    store.write(&todos);

    let mut copy = store.read();
    copy[0].title = "changed".to_string();
    copy.clear();

    assert_eq!(store.read(), todos);
}

#[test]
fn ensure_seed_is_idempotent() {
    let (store, _medium) = memory_store();

    let seeded = store.ensure_seed(store.read());
    assert_eq!(seeded, seed_todos());
    assert_eq!(store.read(), seed_todos());

    let again = store.ensure_seed(store.read());
    assert_eq!(again, seeded);
    assert_eq!(store.read().len(), 3);
}

#[test]
fn read_seeded_writes_only_when_seeding() {
    let (store, medium) = memory_store();

    assert_eq!(store.read_seeded(), seed_todos());
    let seeded_raw = medium.get_item(DEFAULT_STORAGE_KEY).unwrap();
    assert!(seeded_raw.is_some());

    let todos = sample_todos();
    let raw = serde_json::to_string(&todos).unwrap();
    medium.set_item(DEFAULT_STORAGE_KEY, &raw).unwrap();
    assert_eq!(store.read_seeded(), todos);
    assert_eq!(medium.get_item(DEFAULT_STORAGE_KEY).unwrap(), Some(raw));
}

#[test]
fn ensure_seed_leaves_non_empty_collection_untouched() {
    let (store, _medium) = memory_store();
    let todos = sample_todos();
    store.write(&todos);

    let result = store.ensure_seed(todos.clone());
    assert_eq!(result, todos);
    assert_eq!(store.read(), todos);
}

#[test]
fn corrupt_medium_falls_back_to_last_in_process_copy() {
    let (store, medium) = memory_store();
    let todos = sample_todos();
    store.write(&todos);

    medium
        .set_item(DEFAULT_STORAGE_KEY, "{not json")
        .unwrap();
    assert_eq!(store.read(), todos);
}

#[test]
fn unavailable_medium_degrades_to_in_process_copy() {
    let (store, medium) = memory_store();
    medium.set_available(false);

    let todos = sample_todos();
    store.write(&todos);
    assert_eq!(store.read(), todos);

    medium.set_available(true);
    assert_eq!(medium.get_item(DEFAULT_STORAGE_KEY).unwrap(), None);
    assert_eq!(store.read(), todos);
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        db_path: Some(dir.path().join("todos.sqlite3")),
        ..AppConfig::default()
    };
    let todos = sample_todos();

    {
        let store = TodoStore::open(&config);
        assert!(store.is_durable());
        store.write(&todos);
    }

    let reopened = TodoStore::open(&config);
    assert_eq!(reopened.read(), todos);
}

#[test]
fn store_without_db_path_runs_degraded() {
    let store = TodoStore::open(&AppConfig::default());
    assert!(!store.is_durable());
    assert_eq!(store.key(), DEFAULT_STORAGE_KEY);
    assert!(store.read().is_empty());
}

#[test]
fn store_keys_are_isolated_in_shared_medium() {
    let medium = SqliteStorage::open_in_memory().unwrap();
    medium.set_item("other-app:todos", "[]").unwrap();
    let store = TodoStore::new(Box::new(medium), "tests:todos");

    let todos = sample_todos();
    store.write(&todos);
    assert_eq!(store.read(), todos);
}

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "local_storage");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "local_storage");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn newer_schema_file_makes_store_fall_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let config = AppConfig {
        db_path: Some(path),
        ..AppConfig::default()
    };
    let store = TodoStore::open(&config);
    assert!(!store.is_durable());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
