//! Ingestion mapper: feed records -> `asteroids`, `asteroid_diameters`, `close_approaches`
//!
//! Each asteroid is written parent-first in its own transaction. A failure
//! mid-run leaves the asteroids already processed committed.

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::config::MAX_FEED_WINDOW_DAYS;
use crate::db::execute_in_transaction;
use crate::errors::Result;
use crate::feed::{DiameterUnit, FeedResponse, RawAsteroid, RawCloseApproach, RawDiameter};
use crate::feed_client::FeedSource;
use crate::store::AsteroidStore;

/// Inclusive calendar window requested from the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl IngestWindow {
    /// `[end - days, end]`. `days` is clamped to the feed's 7 day limit.
    pub fn ending_on(end: NaiveDate, days: u32) -> Self {
        let days = days.min(MAX_FEED_WINDOW_DAYS);
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Window ending on the local calendar date
    pub fn ending_today(days: u32) -> Self {
        Self::ending_on(chrono::Local::now().date_naive(), days)
    }
}

impl std::fmt::Display for IngestWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Per-run row counters. Operator reporting only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    /// Asteroid rows upserted
    pub asteroids: u64,
    /// Diameter rows upserted
    pub diameters: u64,
    /// Close-approach rows upserted
    pub approaches: u64,
    /// Close-approach entries dropped because only the last one is kept
    pub approaches_collapsed: u64,
    /// Diameter entries in an unrecognised unit
    pub skipped_units: u64,
}

impl IngestCounts {
    fn absorb(&mut self, other: Self) {
        self.asteroids += other.asteroids;
        self.diameters += other.diameters;
        self.approaches += other.approaches;
        self.approaches_collapsed += other.approaches_collapsed;
        self.skipped_units += other.skipped_units;
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub window: IngestWindow,
    #[serde(flatten)]
    pub counts: IngestCounts,
}

/// Fetch the window from `source` and write every record into the store.
///
/// The payload is validated before anything is written: a transport failure or
/// a response without `near_earth_objects` leaves the store untouched.
pub async fn run_ingestion(
    store: &AsteroidStore,
    source: &dyn FeedSource,
    window: IngestWindow,
) -> Result<IngestReport> {
    tracing::info!(%window, "starting ingestion");

    let payload = source.fetch_feed(window.start, window.end).await?;
    let feed = FeedResponse::from_value(&payload)?;
    let records = feed.record_count();

    let counts = store.ingest(feed).await?;

    tracing::info!(
        %window,
        records,
        asteroids = counts.asteroids,
        diameters = counts.diameters,
        approaches = counts.approaches,
        approaches_collapsed = counts.approaches_collapsed,
        skipped_units = counts.skipped_units,
        "ingestion complete"
    );

    Ok(IngestReport { window, counts })
}

/// Write every record of `feed`, dates ascending, feed order within a date.
pub fn ingest_feed(conn: &mut Connection, feed: &FeedResponse) -> Result<IngestCounts> {
    let mut counts = IngestCounts::default();

    for (date, asteroid) in feed.records() {
        let id = asteroid.neo_reference_id.as_str();
        let written = execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
            write_asteroid(tx, asteroid)
        })
        .map_err(|e| e.context(format!("failed to ingest asteroid {id} ({date})")))?;

        tracing::debug!(
            asteroid_id = id,
            date,
            diameters = written.diameters,
            approach = written.approaches,
            "ingested asteroid"
        );
        counts.absorb(written);
    }

    Ok(counts)
}

fn write_asteroid(tx: &Transaction, asteroid: &RawAsteroid) -> Result<IngestCounts> {
    let id = asteroid.neo_reference_id.as_str();
    let mut counts = IngestCounts {
        asteroids: 1,
        ..IngestCounts::default()
    };

    upsert_asteroid(tx, asteroid)?;

    for (unit_name, diameter) in &asteroid.estimated_diameter {
        match DiameterUnit::parse(unit_name) {
            Some(unit) => {
                upsert_diameter(tx, id, unit, diameter)?;
                counts.diameters += 1;
            }
            None => {
                tracing::warn!(
                    asteroid_id = id,
                    unit = %unit_name,
                    "skipping unknown diameter unit"
                );
                counts.skipped_units += 1;
            }
        }
    }

    // One stored approach per asteroid: the last entry in list order.
    if let Some((last, earlier)) = asteroid.close_approach_data.split_last() {
        upsert_close_approach(tx, id, last)?;
        counts.approaches = 1;
        counts.approaches_collapsed = earlier.len() as u64;
        if !earlier.is_empty() {
            tracing::debug!(
                asteroid_id = id,
                dropped = earlier.len(),
                kept = %last.close_approach_date,
                "collapsed close approaches to the last entry"
            );
        }
    }

    Ok(counts)
}

/// Full overwrite of the scalar columns. Uses an upsert rather than
/// `INSERT OR REPLACE` so the parent row is never deleted under its children.
fn upsert_asteroid(tx: &Transaction, asteroid: &RawAsteroid) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO asteroids
            (neo_reference_id, name, nasa_jpl_url, absolute_magnitude_h,
             is_potentially_hazardous, is_sentry_object)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(neo_reference_id) DO UPDATE SET
            name = excluded.name,
            nasa_jpl_url = excluded.nasa_jpl_url,
            absolute_magnitude_h = excluded.absolute_magnitude_h,
            is_potentially_hazardous = excluded.is_potentially_hazardous,
            is_sentry_object = excluded.is_sentry_object
        "#,
        params![
            asteroid.neo_reference_id,
            asteroid.name,
            asteroid.nasa_jpl_url,
            asteroid.absolute_magnitude_h,
            asteroid.is_potentially_hazardous_asteroid,
            asteroid.is_sentry_object,
        ],
    )?;
    Ok(())
}

fn upsert_diameter(
    tx: &Transaction,
    asteroid_id: &str,
    unit: DiameterUnit,
    diameter: &RawDiameter,
) -> Result<()> {
    tx.execute(
        r#"
        INSERT OR REPLACE INTO asteroid_diameters
            (asteroid_id, unit, diameter_min, diameter_max)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            asteroid_id,
            unit.as_str(),
            diameter.estimated_diameter_min,
            diameter.estimated_diameter_max,
        ],
    )?;
    Ok(())
}

fn upsert_close_approach(
    tx: &Transaction,
    asteroid_id: &str,
    approach: &RawCloseApproach,
) -> Result<()> {
    let velocity = &approach.relative_velocity;
    let miss = &approach.miss_distance;
    tx.execute(
        r#"
        INSERT OR REPLACE INTO close_approaches
            (asteroid_id, close_approach_date, close_approach_date_full,
             epoch_date_close_approach, velocity_km_s, velocity_km_h, velocity_mi_h,
             miss_distance_astronomical, miss_distance_lunar, miss_distance_km,
             miss_distance_miles, orbiting_body)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            asteroid_id,
            approach.close_approach_date,
            approach.close_approach_date_full,
            approach.epoch_date_close_approach,
            velocity.kilometers_per_second,
            velocity.kilometers_per_hour,
            velocity.miles_per_hour,
            miss.astronomical,
            miss.lunar,
            miss.kilometers,
            miss.miles,
            approach.orbiting_body,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{apply_schema, table_counts};
    use crate::errors::ErrorCategory;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.pragma_update(None, "foreign_keys", "ON").expect("fk");
        apply_schema(&conn).expect("schema");
        conn
    }

    fn approach(date: &str, km_s: &str, au: &str) -> Value {
        json!({
            "close_approach_date": date,
            "close_approach_date_full": format!("{date} 10:00"),
            "epoch_date_close_approach": 1_704_190_500_000_i64,
            "relative_velocity": {
                "kilometers_per_second": km_s,
                "kilometers_per_hour": "45000.0",
                "miles_per_hour": "27961.6"
            },
            "miss_distance": {
                "astronomical": au,
                "lunar": "97.25",
                "kilometers": "37399306.5",
                "miles": "23238916.2"
            },
            "orbiting_body": "Earth"
        })
    }

    fn record(id: &str, hazardous: bool, diameters: Value, approaches: Vec<Value>) -> Value {
        json!({
            "neo_reference_id": id,
            "name": format!("({id})"),
            "nasa_jpl_url": format!("https://ssd.jpl.nasa.gov/?sstr={id}"),
            "absolute_magnitude_h": 21.5,
            "is_potentially_hazardous_asteroid": hazardous,
            "is_sentry_object": false,
            "estimated_diameter": diameters,
            "close_approach_data": approaches
        })
    }

    fn feed(payload: Value) -> FeedResponse {
        FeedResponse::from_value(&payload).expect("valid feed")
    }

    #[test]
    fn test_window_is_inclusive_and_clamped() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");
        let window = IngestWindow::ending_on(end, 7);
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"));
        assert_eq!(window.end, end);
        assert_eq!(IngestWindow::ending_on(end, 30), window);
        assert_eq!(window.to_string(), "2024-01-01..=2024-01-08");
    }

    #[test]
    fn test_two_asteroids_one_with_diameters() {
        let mut conn = setup_db();
        let payload = json!({"near_earth_objects": {"2024-01-02": [
            record(
                "1",
                true,
                json!({
                    "kilometers": {"estimated_diameter_min": 0.1, "estimated_diameter_max": 0.2}
                }),
                vec![approach("2024-01-02", "12.5", "0.25")],
            ),
            record("2", false, json!({}), vec![]),
        ]}});

        let counts = ingest_feed(&mut conn, &feed(payload)).expect("ingest");

        assert_eq!(counts.asteroids, 2);
        assert_eq!(counts.diameters, 1);
        assert_eq!(counts.approaches, 1);
        let stored = table_counts(&conn).expect("counts");
        assert_eq!(stored.asteroids, 2);
        assert_eq!(stored.diameters, 1);
        assert_eq!(stored.approaches, 1);
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let mut conn = setup_db();
        let payload = json!({"near_earth_objects": {"2024-01-02": [
            record(
                "1",
                true,
                json!({
                    "meters": {"estimated_diameter_min": 100.0, "estimated_diameter_max": 200.0}
                }),
                vec![approach("2024-01-02", "12.5", "0.25")],
            ),
        ]}});
        let feed = feed(payload);

        ingest_feed(&mut conn, &feed).expect("first");
        let first_counts = table_counts(&conn).expect("counts");
        let first_rows = stored_rows(&conn);
        ingest_feed(&mut conn, &feed).expect("second");

        assert_eq!(table_counts(&conn).expect("counts"), first_counts);
        assert_eq!(stored_rows(&conn), first_rows);
    }

    /// Every column of every table, as text, in key order
    fn stored_rows(conn: &Connection) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for sql in [
            "SELECT * FROM asteroids ORDER BY neo_reference_id",
            "SELECT * FROM asteroid_diameters ORDER BY asteroid_id, unit",
            "SELECT * FROM close_approaches ORDER BY asteroid_id",
        ] {
            let mut stmt = conn.prepare(sql).expect("prepare");
            let width = stmt.column_count();
            let table = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| {
                            row.get::<_, rusqlite::types::Value>(i)
                                .map(|value| format!("{value:?}"))
                        })
                        .collect::<rusqlite::Result<Vec<_>>>()
                })
                .expect("query")
                .collect::<rusqlite::Result<Vec<_>>>()
                .expect("rows");
            rows.extend(table);
        }
        rows
    }

    #[test]
    fn test_storage_failure_names_asteroid_once() {
        let mut conn = setup_db();
        conn.execute_batch("DROP TABLE close_approaches").expect("drop");
        let payload = json!({"near_earth_objects": {"2024-01-02": [record(
            "9",
            false,
            json!({}),
            vec![approach("2024-01-02", "1.0", "0.1")],
        )]}});

        let err = ingest_feed(&mut conn, &feed(payload)).unwrap_err();
        let rendered = err.to_string();
        assert_eq!(err.category(), ErrorCategory::StorageError);
        assert!(rendered.starts_with("storage error: failed to ingest asteroid 9 (2024-01-02)"));
        assert_eq!(rendered.matches("storage error").count(), 1);
        assert_eq!(stored_asteroid_count(&conn), 0);
    }

    fn stored_asteroid_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM asteroids", [], |row| row.get(0))
            .expect("count")
    }

    #[test]
    fn test_last_close_approach_wins() {
        let mut conn = setup_db();
        let payload = json!({"near_earth_objects": {"2024-01-02": [record(
            "1",
            false,
            json!({}),
            vec![
                approach("2024-01-02", "10.0", "0.1"),
                approach("2031-06-15", "22.0", "0.4"),
            ],
        )]}});

        let counts = ingest_feed(&mut conn, &feed(payload)).expect("ingest");
        assert_eq!(counts.approaches, 1);
        assert_eq!(counts.approaches_collapsed, 1);

        let (date, km_s, au): (String, f64, f64) = conn
            .query_row(
                "SELECT close_approach_date, velocity_km_s, miss_distance_astronomical \
                 FROM close_approaches WHERE asteroid_id = '1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("row");
        assert_eq!(date, "2031-06-15");
        assert_eq!(km_s, 22.0);
        assert_eq!(au, 0.4);
    }

    #[test]
    fn test_later_run_overwrites_approach_and_keeps_absent_units() {
        let mut conn = setup_db();
        let first = json!({"near_earth_objects": {"2024-01-02": [record(
            "1",
            false,
            json!({
                "kilometers": {"estimated_diameter_min": 0.1, "estimated_diameter_max": 0.2},
                "feet": {"estimated_diameter_min": 328.0, "estimated_diameter_max": 656.0}
            }),
            vec![approach("2024-01-02", "10.0", "0.1")],
        )]}});
        let second = json!({"near_earth_objects": {"2024-01-05": [record(
            "1",
            true,
            json!({"kilometers": {"estimated_diameter_min": 0.3, "estimated_diameter_max": 0.6}}),
            vec![approach("2024-01-05", "15.0", "0.2")],
        )]}});

        ingest_feed(&mut conn, &feed(first)).expect("first");
        ingest_feed(&mut conn, &feed(second)).expect("second");

        let hazardous: i64 = conn
            .query_row(
                "SELECT is_potentially_hazardous FROM asteroids WHERE neo_reference_id = '1'",
                [],
                |row| row.get(0),
            )
            .expect("asteroid");
        assert_eq!(hazardous, 1);

        let km_max: f64 = conn
            .query_row(
                "SELECT diameter_max FROM asteroid_diameters \
                 WHERE asteroid_id = '1' AND unit = 'kilometers'",
                [],
                |row| row.get(0),
            )
            .expect("km row");
        assert_eq!(km_max, 0.6);

        let stored = table_counts(&conn).expect("counts");
        // feet row from the first run survives
        assert_eq!(stored.diameters, 2);
        assert_eq!(stored.approaches, 1);

        let date: String = conn
            .query_row(
                "SELECT close_approach_date FROM close_approaches WHERE asteroid_id = '1'",
                [],
                |row| row.get(0),
            )
            .expect("approach");
        assert_eq!(date, "2024-01-05");
    }

    #[test]
    fn test_unknown_units_are_skipped() {
        let mut conn = setup_db();
        let payload = json!({"near_earth_objects": {"2024-01-02": [record(
            "1",
            false,
            json!({
                "kilometers": {"estimated_diameter_min": 0.1, "estimated_diameter_max": 0.2},
                "furlongs": {"estimated_diameter_min": 0.5, "estimated_diameter_max": 1.0}
            }),
            vec![],
        )]}});

        let counts = ingest_feed(&mut conn, &feed(payload)).expect("ingest");
        assert_eq!(counts.diameters, 1);
        assert_eq!(counts.skipped_units, 1);
        assert_eq!(table_counts(&conn).expect("counts").diameters, 1);
    }

    #[test]
    fn test_report_serializes_flat() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");
        let report = IngestReport {
            window: IngestWindow::ending_on(end, 1),
            counts: IngestCounts {
                asteroids: 3,
                ..IngestCounts::default()
            },
        };
        let value = serde_json::to_value(report).expect("serialize");
        assert_eq!(value["asteroids"], 3);
        assert_eq!(value["window"]["start"], "2024-01-07");
    }
}
