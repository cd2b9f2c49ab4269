//! External classifier client.
//!
//! Talks to an OpenAI-compatible chat completions endpoint, asking for a
//! JSON object matching the [`ThreatAssessment`] wire shape. Decoding is
//! strict: any transport failure, non-2xx status, or body that does not
//! decode cleanly is an error, which the analyzer treats as "use the
//! rule tier" — no partial recovery is attempted.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::error::AnalyzerError;

use super::{AttackSignal, ThreatAssessment};

/// Client for the external classifier tier.
#[derive(Debug)]
pub struct ClassifierClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

/// Minimal shape of a chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl ClassifierClient {
    /// Builds a client from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should never happen).
    #[must_use]
    pub fn new(config: &ClassifierConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Requests a classification for the signal.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] on any transport failure, non-2xx
    /// status, or response body that does not decode into a
    /// [`ThreatAssessment`] with a confidence in `[0, 1]`.
    pub async fn classify(&self, signal: &AttackSignal) -> Result<ThreatAssessment, AnalyzerError> {
        let prompt = build_prompt(signal);
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a cybersecurity expert analyzing attack patterns.",
                },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.3,
            "max_tokens": 500,
        });

        let url = format!("{}/chat/completions", self.endpoint);
        debug!(url = %url, "requesting external classification");

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AnalyzerError::InvalidResponse("no choices in response".to_string()))?;

        parse_assessment(content)
    }
}

/// Builds the structured classification prompt for a signal.
fn build_prompt(signal: &AttackSignal) -> String {
    format!(
        "Analyze the following attack pattern and provide:\n\
         1. Attack type classification\n\
         2. Threat level (Low/Medium/High/Critical)\n\
         3. Recommended defense mechanisms\n\
         4. Attack characteristics\n\
         \n\
         Attack Data:\n\
         - Type: {}\n\
         - Intensity: {}\n\
         - Duration: {}\n\
         - Target: {}\n\
         - Parameters: {}\n\
         \n\
         Respond with a single JSON object:\n\
         {{\n\
             \"attack_classification\": \"string\",\n\
             \"threat_level\": \"Low|Medium|High|Critical\",\n\
             \"recommended_defenses\": [\"defense1\", \"defense2\"],\n\
             \"characteristics\": {{\n\
                 \"pattern\": \"string\",\n\
                 \"sophistication\": \"Low|Medium|High\",\n\
                 \"potential_damage\": \"string\"\n\
             }},\n\
             \"confidence\": 0.0\n\
         }}",
        signal.attack_type,
        signal.intensity,
        signal.duration,
        signal.target_url.as_deref().unwrap_or("N/A"),
        serde_json::to_string(&signal.parameters).unwrap_or_else(|_| "{}".to_string()),
    )
}

/// Decodes classifier output into an assessment.
///
/// Strips an optional markdown code fence first, then decodes strictly;
/// a decode failure or out-of-range confidence is an error.
fn parse_assessment(content: &str) -> Result<ThreatAssessment, AnalyzerError> {
    let stripped = strip_code_fence(content);

    let assessment: ThreatAssessment = serde_json::from_str(stripped)
        .map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))?;

    if !(0.0..=1.0).contains(&assessment.confidence) {
        return Err(AnalyzerError::InvalidResponse(format!(
            "confidence {} outside [0, 1]",
            assessment.confidence
        )));
    }

    Ok(assessment)
}

/// Extracts the body of the first markdown code fence, if any.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` fences; content
/// without a fence is returned trimmed.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    for opener in ["```json", "```"] {
        if let Some(after) = trimmed.split_once(opener).map(|(_, rest)| rest) {
            if let Some((inner, _)) = after.split_once("```") {
                return inner.trim();
            }
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ThreatLevel;
    use crate::probe::AttackKind;
    use std::collections::HashMap;

    const VALID_BODY: &str = r#"{
        "attack_classification": "flood",
        "threat_level": "High",
        "recommended_defenses": ["rate_limiting"],
        "characteristics": {
            "pattern": "volumetric",
            "sophistication": "Low",
            "potential_damage": "High"
        },
        "confidence": 0.8
    }"#;

    #[test]
    fn strip_json_fence() {
        let fenced = format!("```json\n{VALID_BODY}\n```");
        assert_eq!(strip_code_fence(&fenced), VALID_BODY.trim());
    }

    #[test]
    fn strip_bare_fence() {
        let fenced = format!("```\n{VALID_BODY}\n```");
        assert_eq!(strip_code_fence(&fenced), VALID_BODY.trim());
    }

    #[test]
    fn unfenced_content_passes_through() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn fence_with_prose_around_it() {
        let noisy = format!("Here is the analysis:\n```json\n{VALID_BODY}\n```\nLet me know!");
        let parsed = parse_assessment(&noisy).unwrap();
        assert_eq!(parsed.threat_level, ThreatLevel::High);
    }

    #[test]
    fn parse_valid_assessment() {
        let parsed = parse_assessment(VALID_BODY).unwrap();
        assert_eq!(parsed.classification, "flood");
        assert!((parsed.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_rejects_missing_fields() {
        let err = parse_assessment(r#"{"attack_classification": "flood"}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidResponse(_)));
    }

    #[test]
    fn parse_rejects_unknown_threat_level() {
        let body = VALID_BODY.replace("\"High\"", "\"Apocalyptic\"");
        assert!(parse_assessment(&body).is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_confidence() {
        let body = VALID_BODY.replace("0.8", "1.8");
        let err = parse_assessment(&body).unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }

    #[test]
    fn parse_rejects_prose_without_fence() {
        assert!(parse_assessment("The attack looks serious.").is_err());
    }

    #[test]
    fn prompt_embeds_signal_fields() {
        let signal = AttackSignal {
            attack_type: AttackKind::Injection,
            intensity: 7,
            duration: 45,
            target_url: Some("http://victim.test".to_string()),
            parameters: HashMap::new(),
        };
        let prompt = build_prompt(&signal);
        assert!(prompt.contains("injection"));
        assert!(prompt.contains("Intensity: 7"));
        assert!(prompt.contains("http://victim.test"));
        assert!(prompt.contains("attack_classification"));
    }
}
