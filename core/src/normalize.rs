//! Normalization reader: three tables -> one flat [`NormalizedAsteroid`]
//!
//! Two defaulting policies, kept separate:
//! - diameters default to `0` per unit when the unit's row is absent;
//! - close-approach fields are `null` when the asteroid has no approach row.

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::Result;
use crate::feed::DiameterUnit;

/// Canonical flat asteroid record shared by every read endpoint and the report.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAsteroid {
    pub id: String,
    pub name: Option<String>,
    pub nasa_jpl_url: Option<String>,
    pub absolute_magnitude_h: Option<f64>,
    pub estimated_diameter_km_min: f64,
    pub estimated_diameter_km_max: f64,
    pub estimated_diameter_m_min: f64,
    pub estimated_diameter_m_max: f64,
    pub estimated_diameter_mi_min: f64,
    pub estimated_diameter_mi_max: f64,
    pub estimated_diameter_ft_min: f64,
    pub estimated_diameter_ft_max: f64,
    pub is_potentially_hazardous_asteroid: bool,
    pub is_sentry_object: bool,
    pub close_approach_date: Option<String>,
    pub close_approach_date_full: Option<String>,
    pub epoch_date_close_approach: Option<i64>,
    pub relative_velocity_km_s: Option<f64>,
    pub relative_velocity_km_h: Option<f64>,
    pub relative_velocity_mph: Option<f64>,
    pub miss_distance_au: Option<f64>,
    pub miss_distance_lunar: Option<f64>,
    pub miss_distance_km: Option<f64>,
    pub miss_distance_mi: Option<f64>,
    pub orbiting_body: Option<String>,
}

impl NormalizedAsteroid {
    /// `(min, max)` for a unit, as exposed in the flat fields
    pub fn diameter(&self, unit: DiameterUnit) -> (f64, f64) {
        match unit {
            DiameterUnit::Kilometers => {
                (self.estimated_diameter_km_min, self.estimated_diameter_km_max)
            }
            DiameterUnit::Meters => (self.estimated_diameter_m_min, self.estimated_diameter_m_max),
            DiameterUnit::Miles => {
                (self.estimated_diameter_mi_min, self.estimated_diameter_mi_max)
            }
            DiameterUnit::Feet => {
                (self.estimated_diameter_ft_min, self.estimated_diameter_ft_max)
            }
        }
    }
}

/// `asteroids` LEFT JOIN `close_approaches`, one row
struct AsteroidRow {
    id: String,
    name: Option<String>,
    nasa_jpl_url: Option<String>,
    absolute_magnitude_h: Option<f64>,
    is_potentially_hazardous: Option<i64>,
    is_sentry_object: Option<i64>,
    close_approach_date: Option<String>,
    close_approach_date_full: Option<String>,
    epoch_date_close_approach: Option<i64>,
    velocity_km_s: Option<f64>,
    velocity_km_h: Option<f64>,
    velocity_mi_h: Option<f64>,
    miss_distance_astronomical: Option<f64>,
    miss_distance_lunar: Option<f64>,
    miss_distance_km: Option<f64>,
    miss_distance_miles: Option<f64>,
    orbiting_body: Option<String>,
}

/// Reconstruct one asteroid. `Ok(None)` when no asteroid row exists.
pub fn normalize_asteroid(
    conn: &Connection,
    asteroid_id: &str,
) -> Result<Option<NormalizedAsteroid>> {
    let row = conn
        .query_row(
            r#"
            SELECT
                a.neo_reference_id, a.name, a.nasa_jpl_url, a.absolute_magnitude_h,
                a.is_potentially_hazardous, a.is_sentry_object,
                c.close_approach_date, c.close_approach_date_full, c.epoch_date_close_approach,
                c.velocity_km_s, c.velocity_km_h, c.velocity_mi_h,
                c.miss_distance_astronomical, c.miss_distance_lunar,
                c.miss_distance_km, c.miss_distance_miles, c.orbiting_body
            FROM asteroids a
            LEFT JOIN close_approaches c ON a.neo_reference_id = c.asteroid_id
            WHERE a.neo_reference_id = ?1
            "#,
            params![asteroid_id],
            |row| {
                Ok(AsteroidRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    nasa_jpl_url: row.get(2)?,
                    absolute_magnitude_h: row.get(3)?,
                    is_potentially_hazardous: row.get(4)?,
                    is_sentry_object: row.get(5)?,
                    close_approach_date: row.get(6)?,
                    close_approach_date_full: row.get(7)?,
                    epoch_date_close_approach: row.get(8)?,
                    velocity_km_s: row.get(9)?,
                    velocity_km_h: row.get(10)?,
                    velocity_mi_h: row.get(11)?,
                    miss_distance_astronomical: row.get(12)?,
                    miss_distance_lunar: row.get(13)?,
                    miss_distance_km: row.get(14)?,
                    miss_distance_miles: row.get(15)?,
                    orbiting_body: row.get(16)?,
                })
            },
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let diameters = diameters_by_unit(conn, asteroid_id)?;
    let size = |unit: DiameterUnit| diameters.get(&unit).copied().unwrap_or((0.0, 0.0));
    let (km_min, km_max) = size(DiameterUnit::Kilometers);
    let (m_min, m_max) = size(DiameterUnit::Meters);
    let (mi_min, mi_max) = size(DiameterUnit::Miles);
    let (ft_min, ft_max) = size(DiameterUnit::Feet);

    Ok(Some(NormalizedAsteroid {
        id: row.id,
        name: row.name,
        nasa_jpl_url: row.nasa_jpl_url,
        absolute_magnitude_h: row.absolute_magnitude_h,
        estimated_diameter_km_min: km_min,
        estimated_diameter_km_max: km_max,
        estimated_diameter_m_min: m_min,
        estimated_diameter_m_max: m_max,
        estimated_diameter_mi_min: mi_min,
        estimated_diameter_mi_max: mi_max,
        estimated_diameter_ft_min: ft_min,
        estimated_diameter_ft_max: ft_max,
        is_potentially_hazardous_asteroid: row.is_potentially_hazardous.unwrap_or(0) != 0,
        is_sentry_object: row.is_sentry_object.unwrap_or(0) != 0,
        close_approach_date: row.close_approach_date,
        close_approach_date_full: row.close_approach_date_full,
        epoch_date_close_approach: row.epoch_date_close_approach,
        relative_velocity_km_s: row.velocity_km_s,
        relative_velocity_km_h: row.velocity_km_h,
        relative_velocity_mph: row.velocity_mi_h,
        miss_distance_au: row.miss_distance_astronomical,
        miss_distance_lunar: row.miss_distance_lunar,
        miss_distance_km: row.miss_distance_km,
        miss_distance_mi: row.miss_distance_miles,
        orbiting_body: row.orbiting_body,
    }))
}

/// Known-unit diameter rows; rows in other units are ignored.
fn diameters_by_unit(
    conn: &Connection,
    asteroid_id: &str,
) -> Result<HashMap<DiameterUnit, (f64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT unit, diameter_min, diameter_max FROM asteroid_diameters WHERE asteroid_id = ?1",
    )?;
    let rows = stmt.query_map(params![asteroid_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<f64>>(1)?,
            row.get::<_, Option<f64>>(2)?,
        ))
    })?;

    let mut by_unit = HashMap::new();
    for row in rows {
        let (unit, min, max) = row?;
        if let Some(unit) = DiameterUnit::parse(&unit) {
            by_unit.insert(unit, (min.unwrap_or(0.0), max.unwrap_or(0.0)));
        }
    }
    Ok(by_unit)
}

/// Every stored id, in table order
pub fn list_asteroid_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT neo_reference_id FROM asteroids")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Normalize every stored asteroid, in id enumeration order
pub fn normalize_all(conn: &Connection) -> Result<Vec<NormalizedAsteroid>> {
    let ids = list_asteroid_ids(conn)?;
    let mut all = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(asteroid) = normalize_asteroid(conn, id)? {
            all.push(asteroid);
        }
    }
    Ok(all)
}

/// Normalize the given ids, silently skipping ids that are not stored
pub fn normalize_many(conn: &Connection, ids: &[String]) -> Result<Vec<NormalizedAsteroid>> {
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        match normalize_asteroid(conn, id)? {
            Some(asteroid) => found.push(asteroid),
            None => tracing::debug!(asteroid_id = %id, "asteroid not found, skipping"),
        }
    }
    Ok(found)
}
