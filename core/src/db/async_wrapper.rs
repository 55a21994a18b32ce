//! Async bridge for pooled SQLite connections
//!
//! SQLite calls are synchronous. `with_connection` checks a connection out of
//! the pool and runs the closure on Tokio's blocking thread pool so request
//! handlers never block the runtime.

use rusqlite::Connection;

use super::DbPool;
use crate::errors::{NeoError, Result};

/// Run a synchronous database operation from async code.
///
/// The connection is held only for the duration of `f`.
pub async fn with_connection<F, T>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await
    .map_err(|e| NeoError::internal(format!("blocking db task failed: {e}")))?
}
