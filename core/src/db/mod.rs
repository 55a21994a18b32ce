//! SQLite storage layer for the NEO store
//!
//! This module provides:
//! - Connection pooling (r2d2-sqlite) with per-connection pragmas
//! - Idempotent schema creation and table counts
//! - Transaction helper with automatic rollback
//! - Async bridge (`spawn_blocking`) for pooled connections

pub mod async_wrapper;
pub mod connection;
pub mod schema;
pub mod transactions;

pub use async_wrapper::with_connection;
pub use connection::{DbPool, initialize_pool};
pub use schema::{TableCounts, apply_schema, table_counts};
pub use transactions::execute_in_transaction;
