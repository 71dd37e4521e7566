//! Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::credentials;
use super::error::{classify_http_failure, AssistantError};
use crate::config::AssistantConfig;
use crate::types::{Message, ModelTier};

/// One assistant turn as sent to a backend
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    /// Prior turns, already stripped of side content and empty entries
    pub history: Vec<Message>,
    pub message: String,
    pub tier: ModelTier,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    fast_model: String,
    deep_model: String,
    temperature: f64,
    deep_thinking_budget: u32,
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(format!("axiom-path/{}", crate::VERSION))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fast_model: config.fast_model.clone(),
            deep_model: config.deep_model.clone(),
            temperature: config.temperature,
            deep_thinking_budget: config.deep_thinking_budget,
        })
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Deep => &self.deep_model,
        }
    }

    fn endpoint(&self, tier: ModelTier) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_for(tier))
    }

    /// The configured key, validated
    fn api_key(&self) -> Result<&str, AssistantError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AssistantError::MissingCredential)?;
        credentials::validate(key)?;
        Ok(key)
    }
}

#[async_trait]
impl AssistantBackend for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError> {
        let api_key = self.api_key()?;
        let thinking_budget = match request.tier {
            ModelTier::Deep => Some(self.deep_thinking_budget),
            ModelTier::Fast => None,
        };
        let body = build_request_body(&request, self.temperature, thinking_budget);

        debug!(
            "Gemini request: model={} history={} tier={}",
            self.model_for(request.tier),
            request.history.len(),
            request.tier
        );

        let response = self
            .http
            .post(self.endpoint(request.tier))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AssistantError::Transport {
            detail: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            let err = classify_http_failure(status.as_u16(), &text);
            warn!("Gemini API error ({}): {}", status, err.kind());
            return Err(err);
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| AssistantError::Unclassified {
            status: status.as_u16(),
            detail: format!("invalid JSON response: {}", e),
        })?;

        extract_text(&value).ok_or(AssistantError::EmptyResponse)
    }
}

/// Build the request body.
///
/// Gemini mixes casing: `system_instruction` is snake_case while
/// `generationConfig` and `thinkingConfig` are camelCase.
pub fn build_request_body(
    request: &GenerationRequest,
    temperature: f64,
    thinking_budget: Option<u32>,
) -> Value {
    let mut contents: Vec<Value> = request
        .history
        .iter()
        .filter(|m| !m.text.trim().is_empty())
        .map(|m| {
            json!({
                "role": m.role.to_gemini_string(),
                "parts": [{ "text": m.text }]
            })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": request.message }]
    }));

    let mut generation_config = json!({ "temperature": temperature });
    if let Some(budget) = thinking_budget {
        generation_config["thinkingConfig"] = json!({ "thinkingBudget": budget });
    }

    json!({
        "system_instruction": { "parts": [{ "text": request.system_instruction }] },
        "contents": contents,
        "generationConfig": generation_config
    })
}

/// Joined text parts of the first candidate, if any are non-blank
pub fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
