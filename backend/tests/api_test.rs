//! Tests for the HTTP handlers
//!
//! Handlers are called directly with `State`/`Json` extractors.

mod common;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use backoffice_orchestrator::api::orchestrator::{
    clear_session, get_config, list_destinations, orchestrate, plan, registry_stats,
    update_config, ClearSessionRequest, PlanRequest,
};
use backoffice_orchestrator::destinations::{ORDER_CENTER, PRODUCT_CENTER};
use backoffice_orchestrator::error::AppError;
use backoffice_orchestrator::orchestrator::config::{ConfigUpdateRequest, OrchestratorConfig};
use backoffice_orchestrator::orchestrator::pipeline::OrchestrationRequest;
use backoffice_orchestrator::orchestrator::registry::DestinationRegistry;
use backoffice_orchestrator::state::AppState;
use common::{build, scripted, task_json, with_recording, Behavior};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State with the built-in destinations; every completion returns `response`
fn default_state(response: &str) -> Arc<RwLock<AppState>> {
    Arc::new(RwLock::new(AppState::new(
        OrchestratorConfig::default(),
        scripted(response),
    )))
}

#[tokio::test]
async fn test_list_destinations() {
    let state = default_state("[]");

    let Json(response) = list_destinations(State(state)).await;

    assert_eq!(response.count, 2);
    assert_eq!(response.destinations[0].name, PRODUCT_CENTER);
    assert_eq!(response.destinations[1].name, ORDER_CENTER);
    assert_eq!(response.default_destination, PRODUCT_CENTER);
}

#[tokio::test]
async fn test_plan_returns_tasks_and_groups() {
    let extraction = task_json(&[
        (ORDER_CENTER, "cancel_order", "order_id = ORD-1", 2),
        (PRODUCT_CENTER, "search_product", "name contains 'tea'", 1),
    ]);
    let state = default_state(&extraction);

    let Json(preview) = plan(
        State(state.clone()),
        Json(PlanRequest {
            utterance: "find tea then cancel ORD-1".to_string(),
            session_id: None,
            user_id: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(preview.tasks[0].destination, PRODUCT_CENTER);
    let keys: Vec<&str> = preview.grouped.keys().collect();
    assert_eq!(keys, vec![PRODUCT_CENTER, ORDER_CENTER]);

    // Planning never builds handlers
    let Json(stats) = registry_stats(State(state)).await;
    assert_eq!(stats.total_sessions, 0);
}

#[tokio::test]
async fn test_orchestrate_runs_builtin_destinations() {
    // Extraction and the handler share the same scripted answer, which
    // is not a task list, so the fallback plan is run
    let state = default_state(r#"{"message": "found 4 products"}"#);

    let Json(outcome) = orchestrate(
        State(state.clone()),
        Json(OrchestrationRequest {
            utterance: "coffee".to_string(),
            session_id: Some("s1".to_string()),
            user_id: Some("alice".to_string()),
            initial_context: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.tasks[0].destination, PRODUCT_CENTER);
    assert_eq!(outcome.final_message.as_deref(), Some("found 4 products"));
    assert_eq!(
        outcome
            .result
            .distributed_tasks
            .get(PRODUCT_CENTER)
            .map(|t| t.handler_type.as_str()),
        Some(PRODUCT_CENTER)
    );

    let Json(stats) = registry_stats(State(state.clone())).await;
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.sessions["alice:s1"].agents, vec![PRODUCT_CENTER.to_string()]);

    let Json(cleared) = clear_session(
        State(state.clone()),
        Json(ClearSessionRequest {
            user_id: Some("alice".to_string()),
            session_id: Some("s1".to_string()),
        }),
    )
    .await;
    assert!(cleared.cleared);

    let Json(cleared) = clear_session(State(state), Json(ClearSessionRequest::default())).await;
    assert!(!cleared.cleared);
}

#[tokio::test]
async fn test_orchestrate_with_custom_registry_serializes_outcome() {
    let (builder, _) = with_recording(
        DestinationRegistry::builder(),
        "Inventory",
        Behavior::Text("restocked".to_string()),
    );
    let config = OrchestratorConfig {
        default_destination: "Inventory".to_string(),
        ..OrchestratorConfig::default()
    };
    let completion = scripted(&task_json(&[("Inventory", "restock", "sku = 1", 1)]));
    let state = Arc::new(RwLock::new(AppState::with_registry(
        config,
        completion,
        build(builder),
    )));

    let Json(outcome) = orchestrate(
        State(state),
        Json(OrchestrationRequest::new("restock sku 1")),
    )
    .await
    .unwrap();

    let body = serde_json::to_value(&outcome).unwrap();
    assert_eq!(body["final_message"], "restocked");
    assert_eq!(body["result"]["successful_count"], 1);
    assert_eq!(body["result"]["distributed_tasks"]["Inventory"]["status"], "executed");
    assert_eq!(body["grouped"]["Inventory"][0]["action"], "restock");
    assert_eq!(body["tasks"][0]["destination"], "Inventory");
    assert!(body["error_message"].is_null());
}

#[tokio::test]
async fn test_orchestrate_rejects_long_utterance() {
    let state = default_state("[]");
    state.write().await.config.max_utterance_length = 5;

    let result = orchestrate(
        State(state),
        Json(OrchestrationRequest::new("this is far too long")),
    )
    .await;

    match result {
        Err(err @ AppError::UtteranceTooLong { .. }) => {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected the utterance to be rejected"),
    }
}

#[tokio::test]
async fn test_plan_rejects_empty_utterance() {
    let state = default_state("[]");

    let result = plan(
        State(state),
        Json(PlanRequest {
            utterance: "  ".to_string(),
            session_id: None,
            user_id: None,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_config_roundtrip() {
    // Not a task list, so every plan is the fallback plan
    let state = default_state("no tasks here");

    let Json(config) = get_config(State(state.clone())).await;
    assert_eq!(config, OrchestratorConfig::default());

    let Json(updated) = update_config(
        State(state.clone()),
        Json(ConfigUpdateRequest {
            default_destination: Some(ORDER_CENTER.to_string()),
            max_utterance_length: Some(200),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(updated.default_destination, ORDER_CENTER);
    assert_eq!(updated.max_utterance_length, 200);

    // The fallback plan now targets the new default destination
    let Json(preview) = plan(
        State(state.clone()),
        Json(PlanRequest {
            utterance: "???".to_string(),
            session_id: None,
            user_id: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(preview.tasks.len(), 1);
    assert_eq!(preview.tasks[0].destination, ORDER_CENTER);

    let Json(current) = get_config(State(state)).await;
    assert_eq!(current.max_utterance_length, 200);
}

#[tokio::test]
async fn test_update_config_rejects_invalid_values() {
    let state = default_state("[]");

    let result = update_config(
        State(state.clone()),
        Json(ConfigUpdateRequest {
            gemini_model: Some(String::new()),
            max_utterance_length: Some(50),
            ..Default::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidConfig(_))));

    // Nothing was applied
    let Json(config) = get_config(State(state)).await;
    assert_eq!(config.max_utterance_length, OrchestratorConfig::default().max_utterance_length);
}

#[tokio::test]
async fn test_update_config_rejects_unregistered_default_destination() {
    // Not a task list, so every run uses the fallback plan
    let state = default_state("no tasks here");

    let result = update_config(
        State(state.clone()),
        Json(ConfigUpdateRequest {
            default_destination: Some("ProductCentre".to_string()),
            ..Default::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidConfig(_))));

    let Json(outcome) = orchestrate(State(state), Json(OrchestrationRequest::new("find tea")))
        .await
        .unwrap();
    assert_eq!(outcome.tasks[0].destination, PRODUCT_CENTER);
    assert!(outcome.result.errors.is_empty());
    assert_eq!(outcome.result.successful_count, 1);
}

#[tokio::test]
async fn test_update_config_keeps_custom_destinations() {
    let (builder, recorder) = with_recording(
        DestinationRegistry::builder(),
        "Inventory",
        Behavior::Text("restocked".to_string()),
    );
    let state = Arc::new(RwLock::new(AppState::with_registry(
        OrchestratorConfig::default(),
        scripted(&task_json(&[("Inventory", "restock", "sku = 1", 1)])),
        build(builder),
    )));

    update_config(
        State(state.clone()),
        Json(ConfigUpdateRequest {
            handler_tracing: Some(true),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    let Json(destinations) = list_destinations(State(state.clone())).await;
    assert_eq!(destinations.count, 1);
    assert_eq!(destinations.destinations[0].name, "Inventory");
    assert_eq!(destinations.default_destination, "Inventory");

    let Json(outcome) = orchestrate(State(state), Json(OrchestrationRequest::new("restock")))
        .await
        .unwrap();
    assert_eq!(outcome.final_message.as_deref(), Some("restocked"));
    assert_eq!(recorder.lock().await.len(), 1);
}
