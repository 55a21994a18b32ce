//! Narrative generation through an OpenAI-compatible chat-completions API

use async_trait::async_trait;
use neo_core::config::NarrativeConfig;
use neo_core::{NeoError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Replaced with the size-distribution chart
pub const SIZE_CHART_TOKEN: &str = "{{MATPLOTLIB_SIZE_CHART}}";
/// Replaced with the risk scatter
pub const RISK_MATRIX_TOKEN: &str = "{{PLOTLY_RISK_MATRIX}}";
/// Replaced with the hazard donut
pub const DANGER_PIE_TOKEN: &str = "{{PLOTLY_DANGER_PIE}}";

/// Fixed instruction sent with every report request
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert asteroid impact analyst. Generate a professional HTML report.

**IMPORTANT: Use these EXACT placeholder strings where visualizations should appear:**
- {{MATPLOTLIB_SIZE_CHART}} - for the asteroid size distribution chart (grouped by ranges)
- {{PLOTLY_RISK_MATRIX}} - for the interactive risk assessment scatter plot
- {{PLOTLY_DANGER_PIE}} - for the hazard distribution pie chart

These will be replaced with actual visualizations. Do NOT generate your own charts or ASCII art.

**STYLING:**
- Clean, professional design with white/light gray backgrounds
- Dark text (#1A1A1A) on light backgrounds
- Accent colors: Teal (#1BA098), Red (#DC143C) for hazards
- Modern sans-serif fonts
- Subtle shadows and borders only
- Responsive layout

**CONTENT STRUCTURE:**
1. Executive Summary with key statistics
2. **INSERT {{PLOTLY_DANGER_PIE}} here** - Hazard Overview
3. **INSERT {{MATPLOTLIB_SIZE_CHART}} here** - Size Distribution by Category
4. **INSERT {{PLOTLY_RISK_MATRIX}} here** - Risk Assessment Matrix
5. Individual Asteroid Analysis
6. Impact Scenarios (if applicable)
7. Specific Mitigation Strategies based on asteroid characteristics
8. Recommendations

Use specific technical details. Avoid vague language."#;

/// User prompt embedding the per-asteroid summary lines
pub fn build_prompt(asteroid_summary: &str) -> String {
    format!(
        "Generate a complete HTML asteroid impact assessment report.\n\n\
         **Asteroids to analyze:**\n{asteroid_summary}\n\n\
         Remember to include the visualization placeholders:\n\
         - {SIZE_CHART_TOKEN}\n\
         - {RISK_MATRIX_TOKEN}\n\
         - {DANGER_PIE_TOKEN}\n\n\
         Start with <!DOCTYPE html>"
    )
}

/// Produces the narrative HTML document.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Single round trip: instruction + prompt in, HTML out.
    async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// reqwest client for `POST {api_base}/chat/completions`
pub struct OpenAiNarrator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiNarrator {
    pub fn new(cfg: &NarrativeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| NeoError::config_with_source("failed to build narrative HTTP client", e))?;

        Ok(Self::with_client(client, cfg))
    }

    /// Creates a narrator with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, cfg: &NarrativeConfig) -> Self {
        Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrator {
    async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(NeoError::narrative(
                "no narrative API key configured (set OPENAI_API_KEY)",
            ));
        }

        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting narrative");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NeoError::narrative_with_source("chat completions request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NeoError::narrative(format!(
                "chat completions returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            NeoError::narrative_with_source("chat completions response is not valid JSON", e)
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| NeoError::narrative("chat completions response has no content"))
    }
}
