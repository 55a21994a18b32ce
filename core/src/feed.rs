//! Typed records for the NeoWs `/feed` response.
//!
//! Feed JSON is validated here, once, where it enters the system. Everything
//! downstream works with these records instead of probing nested keys.

use crate::errors::{NeoError, Result};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::collections::BTreeMap;

/// Top-level key whose absence signals an upstream error (rate limit, bad key, ...).
pub const FEED_COLLECTION_KEY: &str = "near_earth_objects";

/// Units the feed reports `estimated_diameter` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiameterUnit {
    Kilometers,
    Meters,
    Miles,
    Feet,
}

impl DiameterUnit {
    pub const ALL: [Self; 4] = [Self::Kilometers, Self::Meters, Self::Miles, Self::Feet];

    /// Name used by the feed and stored in `asteroid_diameters.unit`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kilometers => "kilometers",
            Self::Meters => "meters",
            Self::Miles => "miles",
            Self::Feet => "feet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kilometers" => Some(Self::Kilometers),
            "meters" => Some(Self::Meters),
            "miles" => Some(Self::Miles),
            "feet" => Some(Self::Feet),
            _ => None,
        }
    }

    /// Suffix used in normalized field names (`estimated_diameter_km_min`, ...)
    pub fn field_suffix(self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Meters => "m",
            Self::Miles => "mi",
            Self::Feet => "ft",
        }
    }
}

impl std::fmt::Display for DiameterUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded feed response: ISO date -> asteroids seen on that date, in feed order.
///
/// Dates iterate in ascending order.
#[derive(Debug, Clone, Default)]
pub struct FeedResponse {
    pub near_earth_objects: BTreeMap<String, Vec<RawAsteroid>>,
}

impl FeedResponse {
    /// Validate and decode a raw feed payload.
    ///
    /// A missing (or non-object) `near_earth_objects` is an
    /// [`NeoError::UpstreamPayload`] carrying the whole payload; a record that
    /// fails to decode is an [`NeoError::Decode`] naming the date and position.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(collection) = value.get(FEED_COLLECTION_KEY).and_then(Value::as_object) else {
            return Err(NeoError::upstream_payload(
                format!("response lacks `{FEED_COLLECTION_KEY}`"),
                value.to_string(),
            ));
        };

        let mut near_earth_objects = BTreeMap::new();
        for (date, records) in collection {
            let records = records.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut decoded = Vec::with_capacity(records.len());
            for (idx, record) in records.iter().enumerate() {
                let asteroid = RawAsteroid::deserialize(record).map_err(|e| {
                    let id = record
                        .get("neo_reference_id")
                        .and_then(Value::as_str)
                        .unwrap_or("<missing id>");
                    NeoError::decode_with_source(
                        format!("feed record #{idx} on {date} ({id})"),
                        e,
                    )
                })?;
                decoded.push(asteroid);
            }
            near_earth_objects.insert(date.clone(), decoded);
        }

        Ok(Self { near_earth_objects })
    }

    /// All records in processing order: dates ascending, feed order within a date.
    pub fn records(&self) -> impl Iterator<Item = (&str, &RawAsteroid)> {
        self.near_earth_objects
            .iter()
            .flat_map(|(date, list)| list.iter().map(move |a| (date.as_str(), a)))
    }

    pub fn record_count(&self) -> usize {
        self.near_earth_objects.values().map(Vec::len).sum()
    }
}

/// Raw feed entries for one date, untouched, for pass-through endpoints.
///
/// Returns an empty list when the date is absent.
pub fn raw_records_for_date(value: &Value, date: &str) -> Result<Vec<Value>> {
    let Some(collection) = value.get(FEED_COLLECTION_KEY).and_then(Value::as_object) else {
        return Err(NeoError::upstream_payload(
            format!("response lacks `{FEED_COLLECTION_KEY}`"),
            value.to_string(),
        ));
    };

    Ok(collection
        .get(date)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

/// One asteroid as the feed describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAsteroid {
    /// Natural key
    pub neo_reference_id: String,
    pub name: String,
    pub nasa_jpl_url: String,
    pub absolute_magnitude_h: f64,
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    pub is_sentry_object: bool,
    /// Keyed by unit name as sent by the feed; unknown units are kept here
    /// and skipped by the mapper.
    #[serde(default)]
    pub estimated_diameter: BTreeMap<String, RawDiameter>,
    #[serde(default)]
    pub close_approach_data: Vec<RawCloseApproach>,
}

#[serde_as]
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawDiameter {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub estimated_diameter_min: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub estimated_diameter_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCloseApproach {
    pub close_approach_date: String,
    #[serde(default)]
    pub close_approach_date_full: Option<String>,
    #[serde(default)]
    pub epoch_date_close_approach: Option<i64>,
    pub relative_velocity: RawRelativeVelocity,
    pub miss_distance: RawMissDistance,
    pub orbiting_body: String,
}

/// NeoWs sends these as decimal strings; plain numbers are accepted too.
#[serde_as]
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawRelativeVelocity {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub kilometers_per_second: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub kilometers_per_hour: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub miles_per_hour: f64,
}

#[serde_as]
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawMissDistance {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub astronomical: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lunar: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub kilometers: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub miles: f64,
}
