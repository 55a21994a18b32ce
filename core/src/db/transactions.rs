//! Transaction helper
//!
//! `execute_in_transaction()` commits when the closure succeeds and rolls back
//! (via `Drop`) when it fails.

use crate::errors::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Execute `operation` inside a transaction with the given behavior.
///
/// # Example
/// ```rust,no_run
/// # use neo_core::db::execute_in_transaction;
/// # use rusqlite::{Connection, TransactionBehavior};
/// # fn example(conn: &mut Connection) -> neo_core::Result<()> {
/// execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
///     tx.execute("INSERT INTO asteroids (neo_reference_id) VALUES (?1)", ["3542519"])?;
///     Ok(())
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn execute_in_transaction<F, T>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    operation: F,
) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(behavior)?;

    match operation(&tx) {
        Ok(result) => {
            tx.commit()?;
            Ok(result)
        }
        // Rollback happens in Drop
        Err(e) => Err(e),
    }
}
