//! Route handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Html;
use chrono::NaiveDate;
use neo_core::NormalizedAsteroid;
use neo_core::feed::raw_records_for_date;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "api_name": "NASA NEO Data Normalizer with Visualizations",
        "version": neo_core::VERSION,
        "endpoints": {
            "database": [
                "/database/asteroids",
                "/database/asteroids/ids",
                "/database/asteroids/{asteroid_id}"
            ],
            "ai_analysis": [
                "/ai/report (POST)"
            ],
            "nasa_api": [
                "/asteroids/{date}"
            ]
        }
    }))
}

/// `GET /database/asteroids`
pub async fn list_asteroids(
    State(state): State<AppState>,
) -> Result<Json<Vec<NormalizedAsteroid>>, ApiError> {
    Ok(Json(state.store.asteroids().await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AsteroidIds {
    pub asteroid_ids: Vec<String>,
}

/// `GET /database/asteroids/ids`
pub async fn list_asteroid_ids(
    State(state): State<AppState>,
) -> Result<Json<AsteroidIds>, ApiError> {
    let asteroid_ids = state.store.asteroid_ids().await?;
    Ok(Json(AsteroidIds { asteroid_ids }))
}

/// `GET /database/asteroids/{asteroid_id}`
pub async fn get_asteroid(
    State(state): State<AppState>,
    Path(asteroid_id): Path<String>,
) -> Result<Json<NormalizedAsteroid>, ApiError> {
    state
        .store
        .asteroid(&asteroid_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Asteroid with ID {asteroid_id} not found")))
}

/// `GET /asteroids/{date}`: raw feed records for one day, fetched live
pub async fn feed_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let not_found = || ApiError::NotFound(format!("No asteroids found for date {date}"));

    // A date the feed can never contain has no entries.
    let Ok(day) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
        return Err(not_found());
    };

    let payload = state
        .feed
        .fetch_feed(day, day)
        .await
        .map_err(|e| ApiError::internal("Error fetching from NASA API", &e))?;
    let records = raw_records_for_date(&payload, &day.format("%Y-%m-%d").to_string())
        .map_err(|e| ApiError::internal("Error fetching from NASA API", &e))?;

    if records.is_empty() {
        return Err(not_found());
    }
    Ok(Json(records))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(rename = "asteroidIds")]
    pub asteroid_ids: Vec<String>,
}

/// `POST /ai/report`
pub async fn generate_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Html<String>, ApiError> {
    match state.reports.assemble(&request.asteroid_ids).await {
        Ok(Some(html)) => Ok(Html(html)),
        Ok(None) => Err(ApiError::NotFound(
            "No asteroids found for provided IDs".to_string(),
        )),
        Err(err) => Err(ApiError::internal("Failed to generate report", &err)),
    }
}
