//! One-line asteroid summaries embedded in the narrative prompt

use neo_core::{NeoError, NormalizedAsteroid, Result};

/// The facts a summary line is built from
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidSummary {
    pub name: String,
    /// Maximum estimated diameter, km
    pub diameter_km: f64,
    pub velocity_km_s: f64,
    pub miss_distance_au: f64,
    pub hazardous: bool,
    /// Full approach timestamp when known, else the approach date
    pub approach: Option<String>,
}

impl AsteroidSummary {
    pub fn from_asteroid(asteroid: &NormalizedAsteroid) -> Self {
        Self {
            name: asteroid
                .name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            diameter_km: asteroid.estimated_diameter_km_max,
            velocity_km_s: asteroid.relative_velocity_km_s.unwrap_or(0.0),
            miss_distance_au: asteroid.miss_distance_au.unwrap_or(0.0),
            hazardous: asteroid.is_potentially_hazardous_asteroid,
            approach: asteroid
                .close_approach_date_full
                .clone()
                .or_else(|| asteroid.close_approach_date.clone()),
        }
    }

    /// Render as `- name, 0.20 km diameter, ...`; zero values are left out.
    ///
    /// Fails on non-finite numbers.
    pub fn line(&self) -> Result<String> {
        for (field, value) in [
            ("diameter", self.diameter_km),
            ("velocity", self.velocity_km_s),
            ("miss distance", self.miss_distance_au),
        ] {
            if !value.is_finite() {
                return Err(NeoError::internal(format!(
                    "{field} of {} is not a finite number",
                    self.name
                )));
            }
        }

        let mut parts = vec![format!("- {}", self.name)];
        if self.diameter_km != 0.0 {
            parts.push(format!("{:.2} km diameter", self.diameter_km));
        }
        if self.velocity_km_s != 0.0 {
            parts.push(format!("{:.2} km/s velocity", self.velocity_km_s));
        }
        if self.miss_distance_au != 0.0 {
            parts.push(format!("Miss distance: {:.4} AU", self.miss_distance_au));
        }
        parts.push(format!("Potentially hazardous: {}", self.hazardous));
        if let Some(approach) = self.approach.as_deref().filter(|a| !a.is_empty()) {
            parts.push(format!("Close approach: {approach}"));
        }

        Ok(parts.join(", "))
    }
}

/// Summary line for one asteroid, degrading to a JSON dump if it cannot be built.
pub fn summary_line(asteroid: &NormalizedAsteroid) -> String {
    match AsteroidSummary::from_asteroid(asteroid).line() {
        Ok(line) => line,
        Err(err) => {
            tracing::warn!(
                asteroid_id = %asteroid.id,
                error = %err,
                "summary failed, using raw record"
            );
            let dump =
                serde_json::to_string_pretty(asteroid).unwrap_or_else(|_| asteroid.id.clone());
            format!("- {dump}")
        }
    }
}

/// Newline-joined summary lines, in input order
pub fn summarize(asteroids: &[NormalizedAsteroid]) -> String {
    asteroids
        .iter()
        .map(summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::asteroid;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_summary_line() {
        let mut a = asteroid("1", 0.2, true);
        a.name = Some("(2024 AB)".to_string());
        a.relative_velocity_km_s = Some(12.346);
        a.miss_distance_au = Some(0.031_23);
        a.close_approach_date = Some("2024-01-02".to_string());
        a.close_approach_date_full = Some("2024-Jan-02 04:11".to_string());

        assert_eq!(
            summary_line(&a),
            "- (2024 AB), 0.20 km diameter, 12.35 km/s velocity, \
             Miss distance: 0.0312 AU, Potentially hazardous: true, \
             Close approach: 2024-Jan-02 04:11"
        );
    }

    #[test]
    fn test_zero_and_missing_values_are_omitted() {
        let mut a = asteroid("2", 0.0, false);
        a.name = None;

        assert_eq!(summary_line(&a), "- Unknown, Potentially hazardous: false");
    }

    #[test]
    fn test_approach_date_used_without_full_timestamp() {
        let mut a = asteroid("3", 0.0, false);
        a.close_approach_date = Some("2024-01-05".to_string());

        assert!(summary_line(&a).ends_with("Close approach: 2024-01-05"));
    }

    #[test]
    fn test_non_finite_value_degrades_to_dump() {
        let mut a = asteroid("4", 0.1, false);
        a.relative_velocity_km_s = Some(f64::INFINITY);

        assert!(AsteroidSummary::from_asteroid(&a).line().is_err());
        let line = summary_line(&a);
        assert!(line.starts_with("- {"));
        assert!(line.contains("\"id\": \"4\""));
    }

    #[test]
    fn test_summarize_joins_lines() {
        let all = vec![asteroid("a", 0.1, false), asteroid("b", 0.2, true)];
        assert_eq!(summarize(&all).lines().count(), 2);
    }
}
