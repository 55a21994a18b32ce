//! AI narrative report over stored NEO data
//!
//! [`ReportAssembler`] resolves asteroids through the store, renders the
//! three charts, asks the [`NarrativeGenerator`] for an HTML document and
//! splices the charts into its placeholder tokens.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod assembler;
pub mod charts;
pub mod narrative;
pub mod summary;

pub use assembler::ReportAssembler;
pub use charts::{ChartRenderer, SvgChartRenderer};
pub use narrative::{NarrativeGenerator, OpenAiNarrator};
pub use summary::{AsteroidSummary, summary_line};

#[cfg(test)]
pub(crate) mod test_support {
    use neo_core::NormalizedAsteroid;

    /// Minimal asteroid: km diameter and hazard flag set, no approach data.
    pub fn asteroid(id: &str, km_max: f64, hazardous: bool) -> NormalizedAsteroid {
        NormalizedAsteroid {
            id: id.to_string(),
            name: Some(format!("({id})")),
            nasa_jpl_url: None,
            absolute_magnitude_h: None,
            estimated_diameter_km_min: km_max / 2.0,
            estimated_diameter_km_max: km_max,
            estimated_diameter_m_min: 0.0,
            estimated_diameter_m_max: 0.0,
            estimated_diameter_mi_min: 0.0,
            estimated_diameter_mi_max: 0.0,
            estimated_diameter_ft_min: 0.0,
            estimated_diameter_ft_max: 0.0,
            is_potentially_hazardous_asteroid: hazardous,
            is_sentry_object: false,
            close_approach_date: None,
            close_approach_date_full: None,
            epoch_date_close_approach: None,
            relative_velocity_km_s: None,
            relative_velocity_km_h: None,
            relative_velocity_mph: None,
            miss_distance_au: None,
            miss_distance_lunar: None,
            miss_distance_km: None,
            miss_distance_mi: None,
            orbiting_body: None,
        }
    }
}
