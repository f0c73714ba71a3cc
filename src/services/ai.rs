use crate::{config::AppConfig, entities::product, errors::ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Natural-language catalog filtering backed by a generative language
/// model. The model receives the candidate products and the shopper's
/// request and returns the matching subset as JSON.
#[derive(Clone)]
pub struct AiRecommendationService {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl AiRecommendationService {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.ai_api_url.clone(),
            api_key: config.ai_api_key.clone(),
        })
    }

    /// Ask the model to pick, out of `products`, the ones matching the
    /// shopper's request. Returns the model's product list as JSON values.
    #[instrument(skip(self, products))]
    pub async fn recommend(
        &self,
        user_prompt: &str,
        products: &[product::Model],
    ) -> Result<Vec<Value>, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServiceError::ExternalApiError("AI search is not configured.".to_string())
        })?;

        let prompt = build_prompt(user_prompt, products)?;
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!("{}?key={}", self.api_url, api_key);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("AI request failed: {}", e);
                ServiceError::ExternalApiError("AI service is unavailable.".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("AI service returned status {}", status);
            return Err(ServiceError::ExternalApiError(format!(
                "AI service returned status {}",
                status.as_u16()
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            warn!("AI response body unreadable: {}", e);
            ServiceError::ExternalApiError("AI response is empty or invalid.".to_string())
        })?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        let cleaned = clean_ai_text(&text);
        if cleaned.is_empty() {
            return Err(ServiceError::ExternalApiError(
                "AI response is empty or invalid.".to_string(),
            ));
        }
        debug!("AI returned {} chars of JSON", cleaned.len());

        parse_products(&cleaned)
    }
}

fn build_prompt(user_prompt: &str, products: &[product::Model]) -> Result<String, ServiceError> {
    let catalog = serde_json::to_string_pretty(products)
        .map_err(|e| ServiceError::InternalError(format!("Catalog serialization failed: {}", e)))?;

    Ok(format!(
        "Here is a list of available products:\n{catalog}\n\n\
         Based on the following user request, filter and suggest the best \
         matching products: \"{user_prompt}\"\n\n\
         Only return the matching products in JSON format."
    ))
}

/// Strip Markdown code fences the model tends to wrap its JSON in.
fn clean_ai_text(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Accept either a bare JSON array or an object with a `products` array.
fn parse_products(cleaned: &str) -> Result<Vec<Value>, ServiceError> {
    let parsed: Value = serde_json::from_str(cleaned).map_err(|_| {
        ServiceError::ExternalApiError("Failed to parse AI response.".to_string())
    })?;

    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ServiceError::ExternalApiError(
                "Failed to parse AI response.".to_string(),
            )),
        },
        _ => Err(ServiceError::ExternalApiError(
            "Failed to parse AI response.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let raw = "```json\n[{\"name\": \"Desk\"}]\n```";
        assert_eq!(clean_ai_text(raw), "[{\"name\": \"Desk\"}]");
    }

    #[test]
    fn leaves_plain_json_alone() {
        assert_eq!(clean_ai_text("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn parses_bare_array() {
        let items = parse_products("[{\"name\": \"Desk\"}]").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn parses_wrapped_products_object() {
        let items = parse_products("{\"products\": [{\"name\": \"Desk\"}, {\"name\": \"Lamp\"}]}")
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_products("sorry, no matches"),
            Err(ServiceError::ExternalApiError(_))
        ));
    }

    #[test]
    fn rejects_object_without_products() {
        assert!(matches!(
            parse_products("{\"answer\": 42}"),
            Err(ServiceError::ExternalApiError(_))
        ));
    }
}
