//! Care advisory lookups.
//!
//! Asks the Gemini API for watering frequency, light needs and a care tip
//! for a species, with a JSON response schema so the answer parses
//! directly. Strictly best-effort: no API key, a failed request or a
//! malformed answer all degrade to `None` and the caller proceeds with
//! whatever the user typed.

use crate::config::AdvisoryConfig;
use crate::logging;
use serde::Deserialize;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantCareSuggestion {
    pub watering_frequency_days: i64,
    pub light_needs: String,
    pub care_tip: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Clone)]
pub struct CareAdvisor {
    client: reqwest::Client,
    config: AdvisoryConfig,
}

impl CareAdvisor {
    pub fn new(config: AdvisoryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Suggested care parameters for a species, or None when the advisory
    /// service is unconfigured or unavailable.
    pub async fn get_advice(&self, species: &str) -> Option<PlantCareSuggestion> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            logging::info("Advisory lookup skipped: no API key configured");
            return None;
        };

        match self.fetch(api_key, species).await {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                logging::error(&format!("Advisory lookup for '{}' failed: {}", species, e));
                None
            }
        }
    }

    async fn fetch(&self, api_key: &str, species: &str) -> anyhow::Result<PlantCareSuggestion> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.config.model, api_key
        );

        let prompt = format!(
            "Provide care instructions for a houseplant named \"{}\". Return a JSON object \
             with recommended watering frequency in days (number), light needs (short string), \
             a short care tip (string), and scientific name if known.",
            species
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "wateringFrequencyDays": { "type": "NUMBER", "description": "Days between watering" },
                        "lightNeeds": { "type": "STRING", "description": "Light requirements e.g., 'Low light', 'Direct sun'" },
                        "careTip": { "type": "STRING", "description": "A helpful one-sentence tip" },
                        "scientificName": { "type": "STRING", "description": "Scientific Latin name" }
                    },
                    "required": ["wateringFrequencyDays", "lightNeeds", "careTip"]
                }
            }
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("advisory request failed ({}): {}", status, text.trim());
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow::anyhow!("advisory response carried no content"))?;

        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisoryConfig;

    #[test]
    fn test_parse_generate_response() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{
                        "text": "{\"wateringFrequencyDays\": 10, \"lightNeeds\": \"Bright indirect light\", \"careTip\": \"Let soil dry between waterings.\", \"scientificName\": \"Ficus lyrata\"}"
                    }]
                }
            }]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text = &parsed.candidates[0].content.parts[0].text;
        let suggestion: PlantCareSuggestion = serde_json::from_str(text).unwrap();
        assert_eq!(suggestion.watering_frequency_days, 10);
        assert_eq!(suggestion.light_needs, "Bright indirect light");
        assert_eq!(suggestion.scientific_name.as_deref(), Some("Ficus lyrata"));
    }

    #[test]
    fn test_suggestion_scientific_name_optional() {
        let suggestion: PlantCareSuggestion = serde_json::from_str(
            r#"{"wateringFrequencyDays": 7, "lightNeeds": "Low light", "careTip": "Easy going."}"#,
        )
        .unwrap();
        assert!(suggestion.scientific_name.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_returns_none() {
        let advisor = CareAdvisor::new(AdvisoryConfig::default());
        assert!(!advisor.is_configured());
        assert!(advisor.get_advice("Monstera").await.is_none());
    }
}
