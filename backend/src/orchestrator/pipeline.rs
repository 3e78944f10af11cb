//! Orchestration pipeline
//!
//! Composes extraction, grouping and distribution into a single call that
//! always produces an inspectable outcome.

use crate::orchestrator::completion::TextCompletionPort;
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::distributor::TaskDistributor;
use crate::orchestrator::extractor::TaskExtractorRouter;
use crate::orchestrator::grouper;
use crate::orchestrator::registry::DestinationRegistry;
use crate::orchestrator::types::{DistributionResult, GroupedTaskMap, OrderedTaskList};
use crate::orchestrator::utils::hash_utterance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Input for one orchestration run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrchestrationRequest {
    /// Free-form user command
    pub utterance: String,
    /// Session identifier (optional)
    #[serde(default)]
    pub session_id: Option<String>,
    /// User identifier (optional)
    #[serde(default)]
    pub user_id: Option<String>,
    /// Shared context for the first destination (optional)
    #[serde(default)]
    pub initial_context: Option<Value>,
}

impl OrchestrationRequest {
    /// Request with no ids or context
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            ..Self::default()
        }
    }
}

/// Extraction and grouping without execution
#[derive(Debug, Clone, Serialize)]
pub struct PlanPreview {
    /// Tasks in priority order
    pub tasks: OrderedTaskList,
    /// Commands per destination, in execution order
    pub grouped: GroupedTaskMap,
}

/// Everything a caller needs after a run
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationOutcome {
    /// Identifier for this run
    pub request_id: Uuid,
    /// Extracted tasks in priority order
    pub tasks: OrderedTaskList,
    /// Grouped commands that were distributed
    pub grouped: GroupedTaskMap,
    /// Aggregate distribution result
    pub result: DistributionResult,
    /// `message` of the last successful destination
    pub final_message: Option<String>,
    /// All errors joined with `"; "`
    pub error_message: Option<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl OrchestrationOutcome {
    /// True when no destination reported an error
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

/// Extract → group → distribute
pub struct Orchestrator {
    extractor: TaskExtractorRouter,
    distributor: TaskDistributor,
    registry: Arc<DestinationRegistry>,
}

impl Orchestrator {
    /// Build a pipeline over `registry`
    ///
    /// The extraction model and fallback destination come from `config`.
    pub fn new(
        config: &OrchestratorConfig,
        completion: Arc<dyn TextCompletionPort>,
        registry: Arc<DestinationRegistry>,
    ) -> Self {
        let extractor =
            TaskExtractorRouter::new(completion, registry.clone(), config.default_destination.clone())
                .with_model(Some(config.gemini_model.clone()));
        Self {
            extractor,
            distributor: TaskDistributor::new(registry.clone()),
            registry,
        }
    }

    /// Destination registry used by this pipeline
    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        &self.registry
    }

    /// Extractor used by this pipeline
    pub fn extractor(&self) -> &TaskExtractorRouter {
        &self.extractor
    }

    /// Extract and group without invoking any destination
    pub async fn plan(
        &self,
        utterance: &str,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> PlanPreview {
        let tasks = self
            .extractor
            .extract_and_route(utterance, session_id, user_id)
            .await;
        let grouped = grouper::group(&tasks);
        PlanPreview { tasks, grouped }
    }

    /// Run the full pipeline
    ///
    /// Never fails. A panic while grouping or distributing is reported as a
    /// single error with an empty grouped map and zeroed counters.
    pub async fn run(&self, request: OrchestrationRequest) -> OrchestrationOutcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "orchestration",
            request_id = %request_id,
            utterance_hash = %hash_utterance(&request.utterance),
        );
        self.run_inner(request_id, request).instrument(span).await
    }

    async fn run_inner(&self, request_id: Uuid, request: OrchestrationRequest) -> OrchestrationOutcome {
        let started_at = Utc::now();
        let OrchestrationRequest {
            utterance,
            session_id,
            user_id,
            initial_context,
        } = request;

        tracing::info!("Orchestration started");

        let tasks = self
            .extractor
            .extract_and_route(&utterance, session_id.as_deref(), user_id.as_deref())
            .await;

        let distributor = self.distributor.clone();
        let staged = tasks.clone();
        let stage = tokio::spawn(async move {
            let grouped = grouper::group(&staged);
            let result = distributor
                .distribute(
                    &grouped,
                    &utterance,
                    session_id.as_deref(),
                    user_id.as_deref(),
                    initial_context,
                )
                .await;
            (grouped, result)
        }
        .in_current_span());

        let (grouped, result) = match stage.await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(error = %e, "Orchestration aborted");
                (
                    GroupedTaskMap::new(),
                    DistributionResult::fatal(format!("orchestration aborted: {}", e)),
                )
            }
        };

        let finished_at = Utc::now();
        let outcome = OrchestrationOutcome {
            request_id,
            final_message: result.final_message().map(str::to_string),
            error_message: result.error_summary(),
            tasks,
            grouped,
            result,
            started_at,
            finished_at,
        };

        tracing::info!(
            task_count = outcome.tasks.len(),
            successful_count = outcome.result.successful_count,
            error_count = outcome.result.errors.len(),
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Orchestration finished"
        );

        outcome
    }
}
