//! Connection pooling and pragma configuration

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::errors::{NeoError, Result};

/// Pool of SQLite connections to the NEO store
pub type DbPool = Pool<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the database at `db_path` and build a pool.
///
/// Every connection handed out by the pool has WAL journaling, foreign keys,
/// a busy timeout and `synchronous = NORMAL` applied. The schema is applied
/// once through the first checked-out connection.
pub fn initialize_pool(db_path: &Path, pool_size: u32) -> Result<DbPool> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            NeoError::storage_with_source(
                format!("failed to create db directory: {}", parent.display()),
                e,
            )
        })?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(apply_pragmas);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| {
            NeoError::storage_with_source(
                format!("failed to open db at {}", db_path.display()),
                e,
            )
        })?;

    {
        let conn = pool.get()?;
        verify_pragmas(&conn)?;
        super::schema::apply_schema(&conn)?;
    }

    tracing::debug!(path = %db_path.display(), pool_size, "NEO store pool initialized");

    Ok(pool)
}

fn apply_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// Foreign keys are load-bearing for the child tables; refuse to run without them.
fn verify_pragmas(conn: &Connection) -> Result<()> {
    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(NeoError::storage("foreign key enforcement is not enabled"));
    }
    Ok(())
}
