//! Connection bootstrap for the storage database.

use super::migrations::migrate;
use super::{DbError, DbResult};
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if missing) a database file and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    connect("file", || Connection::open(path))
}

/// Opens a private in-memory database and migrates it.
pub fn open_db_in_memory() -> DbResult<Connection> {
    connect("memory", Connection::open_in_memory)
}

fn connect(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = open()
        .map_err(DbError::from)
        .and_then(|mut conn| -> DbResult<Connection> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            migrate(&mut conn)?;
            Ok(conn)
        });

    let elapsed_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => debug!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}
