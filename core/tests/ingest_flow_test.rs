//! End-to-end ingestion: mocked NeoWs feed -> SQLite -> normalized reads.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use neo_core::{
    AsteroidStore, ErrorCategory, FeedSource, IngestWindow, NeoWsClient, run_ingestion,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn window() -> IngestWindow {
    IngestWindow::ending_on(NaiveDate::from_ymd_opt(2024, 1, 8).expect("date"), 7)
}

fn two_asteroid_feed() -> Value {
    json!({
        "element_count": 2,
        "near_earth_objects": {
            "2024-01-02": [
                {
                    "neo_reference_id": "2001",
                    "name": "(2024 HZ)",
                    "nasa_jpl_url": "https://ssd.jpl.nasa.gov/?sstr=2001",
                    "absolute_magnitude_h": 20.3,
                    "is_potentially_hazardous_asteroid": true,
                    "estimated_diameter": {
                        "kilometers": {"estimated_diameter_min": 0.1, "estimated_diameter_max": 0.2}
                    },
                    "close_approach_data": [{
                        "close_approach_date": "2024-01-02",
                        "close_approach_date_full": "2024-Jan-02 04:11",
                        "epoch_date_close_approach": 1_704_168_660_000_i64,
                        "relative_velocity": {
                            "kilometers_per_second": "18.2",
                            "kilometers_per_hour": "65520.0",
                            "miles_per_hour": "40711.9"
                        },
                        "miss_distance": {
                            "astronomical": "0.031",
                            "lunar": "12.06",
                            "kilometers": "4637000.1",
                            "miles": "2881000.4"
                        },
                        "orbiting_body": "Earth"
                    }]
                },
                {
                    "neo_reference_id": "2002",
                    "name": "(2024 SAFE)",
                    "nasa_jpl_url": "https://ssd.jpl.nasa.gov/?sstr=2002",
                    "absolute_magnitude_h": 26.0,
                    "is_potentially_hazardous_asteroid": false,
                    "close_approach_data": []
                }
            ]
        }
    })
}

async fn mount_feed(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-01-08"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn open_store(dir: &TempDir) -> AsteroidStore {
    AsteroidStore::open_at_path(&dir.path().join("asteroids.db"), 2).expect("store")
}

#[tokio::test]
async fn test_two_asteroid_scenario() {
    let server = MockServer::start().await;
    mount_feed(&server, two_asteroid_feed()).await;
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let client = NeoWsClient::with_client(reqwest::Client::new(), &server.uri(), "test-key");

    let report = run_ingestion(&store, &client, window()).await.expect("ingest");

    assert_eq!(report.counts.asteroids, 2);
    assert_eq!(report.counts.diameters, 1);
    let counts = store.counts().await.expect("counts");
    assert_eq!(counts.asteroids, 2);
    assert_eq!(counts.diameters, 1);
    assert_eq!(counts.approaches, 1);

    let safe = store.asteroid("2002").await.expect("read").expect("present");
    assert_eq!(safe.estimated_diameter_km_min, 0.0);
    assert_eq!(safe.estimated_diameter_km_max, 0.0);
    assert_eq!(safe.estimated_diameter_ft_max, 0.0);
    assert_eq!(safe.close_approach_date, None);
    assert!(!safe.is_potentially_hazardous_asteroid);

    let hazardous = store.asteroid("2001").await.expect("read").expect("present");
    assert!(hazardous.is_potentially_hazardous_asteroid);
    assert_eq!(hazardous.estimated_diameter_km_max, 0.2);
    assert_eq!(hazardous.estimated_diameter_mi_min, 0.0);
    assert_eq!(hazardous.relative_velocity_km_s, Some(18.2));
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let server = MockServer::start().await;
    mount_feed(&server, two_asteroid_feed()).await;
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let client = NeoWsClient::with_client(reqwest::Client::new(), &server.uri(), "k");

    run_ingestion(&store, &client, window()).await.expect("first");
    let before = store.asteroids().await.expect("read");
    run_ingestion(&store, &client, window()).await.expect("second");
    let after = store.asteroids().await.expect("read");

    assert_eq!(store.counts().await.expect("counts").asteroids, 2);
    assert_eq!(before.len(), 2);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_missing_collection_aborts_before_writes() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        json!({"error": {"code": "API_KEY_INVALID", "message": "An invalid api_key was supplied"}}),
    )
    .await;
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let client = NeoWsClient::with_client(reqwest::Client::new(), &server.uri(), "bad");

    let err = run_ingestion(&store, &client, window()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::UpstreamPayloadError);
    assert!(err.to_string().contains("API_KEY_INVALID"));
    assert_eq!(store.counts().await.expect("counts").asteroids, 0);
}

#[tokio::test]
async fn test_upstream_status_error_aborts_before_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let client = NeoWsClient::with_client(reqwest::Client::new(), &server.uri(), "k");

    let err = run_ingestion(&store, &client, window()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::FeedError);
    assert_eq!(store.counts().await.expect("counts").asteroids, 0);
}

/// In-process feed for callers that do not need HTTP.
struct StaticFeed(Value);

#[async_trait::async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_feed(&self, _start: NaiveDate, _end: NaiveDate) -> neo_core::Result<Value> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_multiple_approaches_keep_last() {
    let mut feed = two_asteroid_feed();
    let approaches = feed["near_earth_objects"]["2024-01-02"][0]["close_approach_data"]
        .as_array_mut()
        .unwrap();
    let mut later = approaches[0].clone();
    later["close_approach_date"] = json!("2030-09-01");
    later["relative_velocity"]["kilometers_per_second"] = json!("7.5");
    approaches.push(later);

    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let report = run_ingestion(&store, &StaticFeed(feed), window())
        .await
        .expect("ingest");

    assert_eq!(report.counts.approaches_collapsed, 1);
    let asteroid = store.asteroid("2001").await.expect("read").expect("present");
    assert_eq!(asteroid.close_approach_date.as_deref(), Some("2030-09-01"));
    assert_eq!(asteroid.relative_velocity_km_s, Some(7.5));
}
