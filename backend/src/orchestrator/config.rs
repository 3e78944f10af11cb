//! Orchestrator configuration
//!
//! Centralized configuration for the extraction, routing and distribution
//! pipeline.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

/// Destination used for the fallback plan when none is configured
pub const DEFAULT_DESTINATION: &str = "ProductCenterAgentManager";

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrchestratorConfig {
    /// Completion request timeout in seconds
    pub gemini_timeout_secs: u64,
    /// Model used for extraction and by LLM-backed handlers
    pub gemini_model: String,
    /// Gemini API base URL
    pub gemini_api_base_url: String,
    /// Maximum utterance length in characters
    pub max_utterance_length: usize,
    /// Destination receiving the fallback plan
    pub default_destination: String,
    /// Whether handlers log their prompts and responses
    pub handler_tracing: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            gemini_timeout_secs: 30,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_utterance_length: 10000, // 10KB
            default_destination: DEFAULT_DESTINATION.to_string(),
            handler_tracing: false,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_timeout_secs: env::var("COMPLETION_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.gemini_timeout_secs),
            gemini_model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.gemini_model),
            gemini_api_base_url: env::var("GEMINI_API_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.gemini_api_base_url),
            max_utterance_length: env::var("MAX_UTTERANCE_LENGTH")
                .ok()
                .and_then(|l| l.parse().ok())
                .unwrap_or(defaults.max_utterance_length),
            default_destination: env::var("DEFAULT_DESTINATION")
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or(defaults.default_destination),
            handler_tracing: env::var("HANDLER_TRACING")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.handler_tracing),
        }
    }
}

/// Request body for updating orchestrator configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdateRequest {
    /// Model name (optional)
    pub gemini_model: Option<String>,
    /// Maximum utterance length in characters (optional)
    pub max_utterance_length: Option<usize>,
    /// Fallback destination (optional)
    pub default_destination: Option<String>,
    /// Handler prompt tracing (optional)
    pub handler_tracing: Option<bool>,
}

/// Validate and apply configuration updates
///
/// Works on an owned copy; on error the copy is dropped and nothing is applied.
///
/// # Arguments
/// * `config` - The current config to update
/// * `request` - The update request with optional fields
///
/// # Returns
/// * `Ok(OrchestratorConfig)` - The updated configuration
/// * `Err(AppError)` - If validation fails
pub fn validate_and_apply_config_update(
    mut config: OrchestratorConfig,
    request: ConfigUpdateRequest,
) -> Result<OrchestratorConfig, AppError> {
    if let Some(model) = request.gemini_model {
        if model.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "gemini_model cannot be empty".to_string(),
            ));
        }
        config.gemini_model = model;
    }

    if let Some(max_length) = request.max_utterance_length {
        if max_length == 0 {
            return Err(AppError::InvalidConfig(
                "max_utterance_length must be > 0".to_string(),
            ));
        }
        config.max_utterance_length = max_length;
    }

    if let Some(destination) = request.default_destination {
        if destination.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "default_destination cannot be empty".to_string(),
            ));
        }
        config.default_destination = destination;
    }

    if let Some(tracing_enabled) = request.handler_tracing {
        config.handler_tracing = tracing_enabled;
    }

    Ok(config)
}
