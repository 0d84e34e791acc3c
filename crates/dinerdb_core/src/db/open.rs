//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have the configured `foreign_keys` pragma.
//! - Returned connections have the schema bootstrap applied.

use super::schema::ensure_schema;
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a database file with default tuning.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_config(&StoreConfig::at(path.as_ref()))
}

/// Opens the configured database file and bootstraps the schema.
///
/// # Side effects
/// - Emits `db_open` events with duration and status.
pub fn open_db_with_config(config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");
    let result = Connection::open(&config.database_path)
        .map_err(DbError::from)
        .and_then(|mut conn| bootstrap_connection(&mut conn, config).map(|()| conn));
    log_open_result("file", started_at, &result);
    result
}

/// Opens an in-memory database and bootstraps the schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            bootstrap_connection(&mut conn, &StoreConfig::default()).map(|()| conn)
        });
    log_open_result("memory", started_at, &result);
    result
}

fn bootstrap_connection(conn: &mut Connection, config: &StoreConfig) -> DbResult<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(config.busy_timeout())?;
    ensure_schema(conn)?;
    Ok(())
}

fn log_open_result(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    match result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
