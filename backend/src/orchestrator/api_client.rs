//! Gemini API client
//!
//! HTTP implementation of [`TextCompletionPort`] backed by the Gemini
//! `generateContent` endpoint.

use crate::orchestrator::completion::{CompletionError, CompletionRequest, TextCompletionPort};
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, RequestContent,
};
use async_trait::async_trait;
use std::time::Duration;

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini-backed completion port
///
/// Holds a shared `reqwest::Client` so connections are pooled across
/// extraction and handler calls.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from orchestrator configuration and an API key
    ///
    /// # Errors
    /// * `CompletionError::Http` if the HTTP client cannot be constructed
    pub fn new(config: &OrchestratorConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gemini_timeout_secs))
            .build()
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client reading the key from `GEMINI_API_KEY`
    ///
    /// A missing key is not an error here: the client is still built and
    /// every call fails with [`CompletionError::MissingApiKey`], which the
    /// extractor turns into its fallback plan.
    pub fn from_env(config: &OrchestratorConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("{} is not set; completion calls will fail", API_KEY_ENV);
        }
        Self::new(config, api_key)
    }

    /// Override the API base URL (used against mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// True when an API key is configured
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl TextCompletionPort for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        if self.api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let model_name = request.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model_name);

        let system_instruction = if request.system.is_empty() {
            None
        } else {
            Some(RequestContent::text(None, request.system.clone()))
        };
        let generation_config = request.force_json.then(|| GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
        });

        let request_body = GeminiApiRequest {
            system_instruction,
            contents: vec![RequestContent::text(Some("user"), request.prompt.clone())],
            generation_config,
        };

        tracing::debug!(
            model = %model_name,
            force_json = request.force_json,
            prompt_len = request.prompt.len(),
            system_len = request.system.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CompletionError::Http(format!("Failed to send request to Gemini API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Gemini API returned error status"
            );

            if status_code == 429 {
                return Err(CompletionError::RateLimited {
                    status: status_code,
                    body: error_body,
                });
            }
            return Err(CompletionError::Status {
                status: status_code,
                body: error_body,
            });
        }

        let response_body = response
            .text()
            .await
            .map_err(|e| CompletionError::Http(format!("Failed to read response body: {}", e)))?;

        let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
            CompletionError::Malformed(format!("{} - Response body: {}", e, response_body))
        })?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(CompletionError::Blocked(reason.clone()));
        }

        let candidate = parsed
            .candidates
            .first()
            .ok_or_else(|| CompletionError::Empty("no candidates".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        if text.is_empty() {
            return Err(CompletionError::Empty(format!(
                "candidate has no text (finish_reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        tracing::debug!(response_len = text.len(), "Received response from Gemini API");
        Ok(text)
    }
}
