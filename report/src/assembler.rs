//! Report assembly: normalized asteroids -> narrative HTML with charts spliced in

use std::sync::Arc;

use neo_core::{AsteroidStore, NormalizedAsteroid, Result};

use crate::charts::ChartRenderer;
use crate::narrative::{
    DANGER_PIE_TOKEN, NarrativeGenerator, RISK_MATRIX_TOKEN, SIZE_CHART_TOKEN, SYSTEM_INSTRUCTION,
    build_prompt,
};
use crate::summary::summarize;

/// Builds the AI report from stored asteroids.
#[derive(Clone)]
pub struct ReportAssembler {
    store: AsteroidStore,
    charts: Arc<dyn ChartRenderer>,
    narrator: Arc<dyn NarrativeGenerator>,
}

impl ReportAssembler {
    pub fn new(
        store: AsteroidStore,
        charts: Arc<dyn ChartRenderer>,
        narrator: Arc<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            store,
            charts,
            narrator,
        }
    }

    /// Assemble the report for `ids`.
    ///
    /// Unknown ids are skipped. Returns `Ok(None)` when none of them resolve.
    pub async fn assemble(&self, ids: &[String]) -> Result<Option<String>> {
        let asteroids = self.store.asteroids_by_ids(ids.to_vec()).await?;
        if asteroids.is_empty() {
            tracing::info!(requested = ids.len(), "no requested asteroid is stored");
            return Ok(None);
        }

        tracing::info!(
            requested = ids.len(),
            resolved = asteroids.len(),
            "assembling asteroid report"
        );
        self.render(&asteroids).await.map(Some)
    }

    /// Charts, prompt, narrative call and token substitution for resolved asteroids
    pub async fn render(&self, asteroids: &[NormalizedAsteroid]) -> Result<String> {
        let size_chart = self.charts.size_chart(asteroids);
        let risk_matrix = self.charts.risk_matrix(asteroids);
        let danger_pie = self.charts.hazard_pie(asteroids);

        let prompt = build_prompt(&summarize(asteroids));
        let narrative = self.narrator.generate(SYSTEM_INSTRUCTION, &prompt).await?;

        Ok(splice_charts(
            &narrative,
            &[
                (SIZE_CHART_TOKEN, size_chart.as_str()),
                (RISK_MATRIX_TOKEN, risk_matrix.as_str()),
                (DANGER_PIE_TOKEN, danger_pie.as_str()),
            ],
        ))
    }
}

/// Replace every occurrence of each token. Tokens the narrative left out are
/// logged; their visual is simply absent from the document.
pub fn splice_charts(narrative: &str, fragments: &[(&str, &str)]) -> String {
    let mut document = narrative.to_string();
    for (token, fragment) in fragments {
        if document.contains(token) {
            document = document.replace(token, fragment);
        } else {
            tracing::warn!(token, "narrative omitted chart placeholder");
        }
    }
    document
}
