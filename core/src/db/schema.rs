//! Schema creation and row counts for the three NEO tables

use rusqlite::Connection;
use serde::Serialize;

use crate::errors::{NeoError, Result};

/// Embedded schema SQL from NEO_SCHEMA.sql
const SCHEMA_SQL: &str = include_str!("../../NEO_SCHEMA.sql");

/// Table names, parent first
pub const TABLES: [&str; 3] = ["asteroids", "asteroid_diameters", "close_approaches"];

/// Apply the schema. Safe to call on every open.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| NeoError::storage_with_source("failed to apply schema", e))?;
    Ok(())
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub asteroids: u64,
    pub diameters: u64,
    pub approaches: u64,
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> Result<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(u64::try_from(n).unwrap_or_default())
    };

    Ok(TableCounts {
        asteroids: count(TABLES[0])?,
        diameters: count(TABLES[1])?,
        approaches: count(TABLES[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        apply_schema(&conn).expect("first apply");
        apply_schema(&conn).expect("second apply");

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('asteroids', 'asteroid_diameters', 'close_approaches')",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(tables, 3);
        assert_eq!(table_counts(&conn).expect("counts"), TableCounts::default());
    }

    #[test]
    fn test_diameter_key_is_asteroid_and_unit() {
        let conn = Connection::open_in_memory().expect("open");
        apply_schema(&conn).expect("apply");
        conn.execute(
            "INSERT INTO asteroids (neo_reference_id, name) VALUES ('1', 'one')",
            [],
        )
        .expect("parent");

        conn.execute(
            "INSERT INTO asteroid_diameters VALUES ('1', 'kilometers', 0.1, 0.2)",
            [],
        )
        .expect("first unit");
        conn.execute(
            "INSERT INTO asteroid_diameters VALUES ('1', 'meters', 100.0, 200.0)",
            [],
        )
        .expect("second unit");
        let dup = conn.execute(
            "INSERT INTO asteroid_diameters VALUES ('1', 'kilometers', 0.3, 0.4)",
            [],
        );
        assert!(dup.is_err());
        assert_eq!(table_counts(&conn).expect("counts").diameters, 2);
    }

    #[test]
    fn test_foreign_keys_reject_orphans_when_enabled() {
        let conn = Connection::open_in_memory().expect("open");
        conn.pragma_update(None, "foreign_keys", "ON").expect("fk");
        apply_schema(&conn).expect("apply");

        let orphan = conn.execute(
            "INSERT INTO close_approaches (asteroid_id, close_approach_date) VALUES ('404', '2024-01-01')",
            [],
        );
        assert!(orphan.is_err());
    }
}
