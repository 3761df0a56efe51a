//! Ordered schema steps for the storage database.
//!
//! Step `n` (1-based) upgrades a database from version `n - 1` to `n`.
//! Steps are append-only; never edit one that has shipped.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

const STEPS: &[&str] = &[include_str!("0001_local_storage.sql")];

/// Schema version produced by running every step.
pub fn latest_version() -> u32 {
    u32::try_from(STEPS.len()).unwrap_or(u32::MAX)
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))
        .map_err(DbError::from)
}

/// Runs pending steps in one transaction.
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this build.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    match found.cmp(&supported) {
        Ordering::Greater => return Err(DbError::SchemaTooNew { found, supported }),
        Ordering::Equal => return Ok(()),
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for (version, sql) in (1u32..).zip(STEPS.iter()).skip(found as usize) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}
