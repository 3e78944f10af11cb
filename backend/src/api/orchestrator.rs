//! Orchestrator API handlers
//!
//! Thin HTTP adapter over [`Orchestrator`](crate::orchestrator::Orchestrator).
//! Requests are validated here; the pipeline itself never fails, so the only
//! error responses come from input validation and configuration updates.

use crate::error::AppError;
use crate::orchestrator::capability::DestinationCapability;
use crate::orchestrator::config::{
    validate_and_apply_config_update, ConfigUpdateRequest, OrchestratorConfig,
};
use crate::orchestrator::pipeline::{OrchestrationOutcome, OrchestrationRequest, PlanPreview};
use crate::orchestrator::registry::CacheStats;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Planning request
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// Free-form user command
    pub utterance: String,
    /// Session identifier (optional)
    #[serde(default)]
    pub session_id: Option<String>,
    /// User identifier (optional)
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One registered destination
#[derive(Debug, Serialize)]
pub struct DestinationInfo {
    /// Destination identifier
    pub name: String,
    /// Declared capability
    pub capability: DestinationCapability,
}

/// Destinations list response
#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    /// Registered destinations in registration order
    pub destinations: Vec<DestinationInfo>,
    /// Destination used by the fallback plan
    pub default_destination: String,
    /// Number of destinations
    pub count: usize,
}

/// Session cache clearing request
#[derive(Debug, Default, Deserialize)]
pub struct ClearSessionRequest {
    /// User identifier (optional)
    #[serde(default)]
    pub user_id: Option<String>,
    /// Session identifier (optional)
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Session cache clearing response
#[derive(Debug, Serialize)]
pub struct ClearSessionResponse {
    /// Whether the session had cached handlers
    pub cleared: bool,
    /// Human-readable message
    pub message: String,
}

/// Reject empty or over-long utterances
///
/// Length is counted in characters, not bytes.
pub fn validate_utterance(utterance: &str, max_length: usize) -> Result<(), AppError> {
    if utterance.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "utterance cannot be empty".to_string(),
        ));
    }
    let len = utterance.chars().count();
    if len > max_length {
        return Err(AppError::UtteranceTooLong {
            len,
            max: max_length,
        });
    }
    Ok(())
}

/// GET /api/destinations - List registered destinations
pub async fn list_destinations(
    State(state): State<Arc<RwLock<AppState>>>,
) -> Json<DestinationsResponse> {
    let state = state.read().await;
    let destinations: Vec<DestinationInfo> = state
        .orchestrator
        .registry()
        .registrations()
        .iter()
        .map(|r| DestinationInfo {
            name: r.name.clone(),
            capability: r.capability.clone(),
        })
        .collect();

    Json(DestinationsResponse {
        count: destinations.len(),
        destinations,
        default_destination: state.config.default_destination.clone(),
    })
}

/// POST /api/plan - Extract and group without executing
///
/// # Returns
/// * `Ok(Json<PlanPreview>)` - Ordered tasks and grouped commands
/// * `Err(AppError)` - If the utterance is empty or too long
pub async fn plan(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanPreview>, AppError> {
    let orchestrator = {
        let state = state.read().await;
        validate_utterance(&request.utterance, state.config.max_utterance_length)?;
        state.orchestrator.clone()
    };

    let preview = orchestrator
        .plan(
            &request.utterance,
            request.session_id.as_deref(),
            request.user_id.as_deref(),
        )
        .await;
    Ok(Json(preview))
}

/// POST /api/orchestrate - Run the full pipeline
///
/// Partial failures are reported inside the outcome (`error_message`,
/// `result.errors`), not as an HTTP error.
///
/// # Returns
/// * `Ok(Json<OrchestrationOutcome>)` - The run's outcome
/// * `Err(AppError)` - If the utterance is empty or too long
pub async fn orchestrate(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<OrchestrationRequest>,
) -> Result<Json<OrchestrationOutcome>, AppError> {
    // Lock is released before the run so config updates are not blocked
    let orchestrator = {
        let state = state.read().await;
        validate_utterance(&request.utterance, state.config.max_utterance_length)?;
        state.orchestrator.clone()
    };

    Ok(Json(orchestrator.run(request).await))
}

/// GET /api/registry/stats - Handler cache statistics
pub async fn registry_stats(State(state): State<Arc<RwLock<AppState>>>) -> Json<CacheStats> {
    let orchestrator = state.read().await.orchestrator.clone();
    Json(orchestrator.registry().cache_stats().await)
}

/// DELETE /api/registry/sessions - Drop one session's cached handlers
pub async fn clear_session(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<ClearSessionRequest>,
) -> Json<ClearSessionResponse> {
    let orchestrator = state.read().await.orchestrator.clone();
    let cleared = orchestrator
        .registry()
        .clear_session(request.user_id.as_deref(), request.session_id.as_deref())
        .await;

    let message = if cleared {
        "Session cache cleared".to_string()
    } else {
        "No cached handlers for session".to_string()
    };
    Json(ClearSessionResponse { cleared, message })
}

/// GET /api/config - Current orchestrator configuration
pub async fn get_config(State(state): State<Arc<RwLock<AppState>>>) -> Json<OrchestratorConfig> {
    Json(state.read().await.config.clone())
}

/// POST /api/config - Update orchestrator configuration
///
/// # Returns
/// * `Ok(Json<OrchestratorConfig>)` - The configuration now in effect
/// * `Err(AppError)` - If validation fails or the default destination is not
///   registered; nothing is applied
pub async fn update_config(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<Json<OrchestratorConfig>, AppError> {
    let mut state = state.write().await;
    let updated = validate_and_apply_config_update(state.config.clone(), request)?;
    if !state
        .orchestrator
        .registry()
        .contains(&updated.default_destination)
    {
        return Err(AppError::InvalidConfig(format!(
            "default_destination '{}' is not a registered destination",
            updated.default_destination
        )));
    }
    state.apply_config(updated);
    Ok(Json(state.config.clone()))
}
