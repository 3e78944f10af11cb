//! Task extraction and routing
//!
//! Turns one user utterance into an [`OrderedTaskList`] with a single
//! structured-output completion call. The model's answer is untrusted:
//! it is validated as a whole and replaced by a deterministic fallback plan
//! when anything about it is wrong.

use crate::orchestrator::completion::{CompletionError, CompletionRequest, TextCompletionPort};
use crate::orchestrator::registry::DestinationRegistry;
use crate::orchestrator::types::{Command, OrderedTaskList, Task};
use crate::orchestrator::utils::{
    hash_utterance, locate_json_payload, strip_reasoning, truncate_for_log,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Action used by the fallback plan
pub const FALLBACK_ACTION: &str = "search_product";

const LOG_PREVIEW_CHARS: usize = 500;

/// Reasons an extraction attempt is discarded
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The completion call itself failed
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    /// Payload is not JSON
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload is JSON but not an array
    #[error("expected a JSON array of tasks, got {0}")]
    NotAList(&'static str),

    /// One record failed validation; the whole batch is rejected
    #[error("task {index} is invalid: {reason}")]
    InvalidRecord {
        /// Zero-based position in the array
        index: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// Extracts, routes and orders tasks from a user utterance
pub struct TaskExtractorRouter {
    completion: Arc<dyn TextCompletionPort>,
    registry: Arc<DestinationRegistry>,
    default_destination: String,
    model: Option<String>,
}

impl TaskExtractorRouter {
    /// Create an extractor over the given destinations
    pub fn new(
        completion: Arc<dyn TextCompletionPort>,
        registry: Arc<DestinationRegistry>,
        default_destination: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            registry,
            default_destination: default_destination.into(),
            model: None,
        }
    }

    /// Use a specific model for extraction calls
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Destination that receives the fallback plan
    pub fn default_destination(&self) -> &str {
        &self.default_destination
    }

    /// Decompose `utterance` into a priority-ordered task list
    ///
    /// Never fails: any completion, parse or validation error yields
    /// [`fallback_plan`](Self::fallback_plan).
    pub async fn extract_and_route(
        &self,
        utterance: &str,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> OrderedTaskList {
        let utterance_hash = hash_utterance(utterance);
        tracing::info!(
            utterance_hash = %utterance_hash,
            utterance_len = utterance.len(),
            session_id = ?session_id,
            user_id = ?user_id,
            "Extracting tasks from utterance"
        );

        match self.try_extract(utterance).await {
            Ok(tasks) => {
                let ordered = OrderedTaskList::from_unsorted(tasks);
                tracing::info!(
                    utterance_hash = %utterance_hash,
                    task_count = ordered.len(),
                    "Extracted task list"
                );
                for (i, task) in ordered.iter().enumerate() {
                    tracing::debug!(
                        position = i + 1,
                        priority = task.priority,
                        destination = %task.destination,
                        action = %task.command.action,
                        "Routed task"
                    );
                }
                ordered
            }
            Err(e) => {
                tracing::warn!(
                    utterance_hash = %utterance_hash,
                    error = %e,
                    destination = %self.default_destination,
                    "Task extraction failed, using fallback plan"
                );
                self.fallback_plan(utterance)
            }
        }
    }

    async fn try_extract(&self, utterance: &str) -> Result<Vec<Task>, ExtractionError> {
        let system = self.build_prompt();
        tracing::debug!(
            prompt_len = system.len(),
            destination_count = self.registry.registrations().len(),
            "Built extraction prompt"
        );

        let request = CompletionRequest::new(system, utterance)
            .with_model(self.model.clone())
            .json();
        let raw = self.completion.complete(request).await?;

        tracing::debug!(
            response = %truncate_for_log(&raw, LOG_PREVIEW_CHARS),
            "Extraction model responded"
        );

        parse_task_list(&raw)
    }

    /// Single-task plan used when extraction fails
    pub fn fallback_plan(&self, utterance: &str) -> OrderedTaskList {
        OrderedTaskList::from_unsorted(vec![Task::new(
            self.default_destination.clone(),
            Command::new(FALLBACK_ACTION, format!("user_request: {}", utterance)),
            1,
        )])
    }

    /// System prompt listing every registered destination
    pub fn build_prompt(&self) -> String {
        let destinations = self
            .registry
            .registrations()
            .iter()
            .map(|r| format!("- {}: {}", r.name, r.capability.format_for_prompt()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a task decomposition, routing and prioritization system for an e-commerce back office.

Input: the user's natural language request.
Output: a structured, routed and prioritized task list.

Your job:
1. Extract clear, actionable tasks from the user's request
2. Write conditions precise enough to be evaluated by the destination
3. Route each task to exactly one of the available destinations
4. Assign an execution priority based on dependencies between tasks
5. Understand requests in any language (English, Japanese, ...)

Output Format (JSON):
[
  {{
    "target_agent": "destination_name",
    "command": {{
      "action": "action_name",
      "condition": "condition_description"
    }},
    "priority": 1
  }}
]

Available Destinations:
{destinations}

Priority Rules:
- Lower numbers run first.
- If a task needs the output of another task, the prerequisite MUST have a strictly lower priority.
  Example: search_product (priority 1) then update_inventory (priority 2) for the products found.
- If the request is ambiguous, choose the most reasonable interpretation.

Examples:

Input: "Unshelve products that are out of stock, and discount the ones priced over 5000 yen."
Output:
[
  {{"target_agent": "ProductCenterAgentManager", "command": {{"action": "deactivate_product", "condition": "stock == 0"}}, "priority": 1}},
  {{"target_agent": "ProductCenterAgentManager", "command": {{"action": "discount_product", "condition": "price > 5000"}}, "priority": 2}}
]

Input: "Search for coffee products and update their inventory"
Output:
[
  {{"target_agent": "ProductCenterAgentManager", "command": {{"action": "search_product", "condition": "product_name contains 'coffee'"}}, "priority": 1}},
  {{"target_agent": "ProductCenterAgentManager", "command": {{"action": "update_inventory", "condition": "product_name contains 'coffee'"}}, "priority": 2}}
]

Every element MUST have "target_agent", "command" (with "action" and "condition") and an integer "priority".
Return ONLY the JSON array, no other text. Extract, route and prioritize the tasks in the user's request."#
        )
    }
}

/// Parse and validate a raw model response into tasks
///
/// Reasoning segments are removed first, then the JSON payload is located
/// (fenced block or bare text). Validation is all-or-nothing: one bad record
/// rejects the batch. Tasks are returned in response order, unsorted.
pub fn parse_task_list(raw: &str) -> Result<Vec<Task>, ExtractionError> {
    let (cleaned, thoughts) = strip_reasoning(raw);
    if let Some(thoughts) = thoughts {
        tracing::debug!(
            thoughts = %truncate_for_log(&thoughts, LOG_PREVIEW_CHARS),
            "Model reasoning segment"
        );
    }

    let payload: Value = serde_json::from_str(locate_json_payload(&cleaned))?;
    let records = match payload {
        Value::Array(records) => records,
        other => return Err(ExtractionError::NotAList(json_kind(&other))),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            parse_record(record).map_err(|reason| ExtractionError::InvalidRecord { index, reason })
        })
        .collect()
}

fn parse_record(record: &Value) -> Result<Task, String> {
    let object = record
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", json_kind(record)))?;

    let destination = object
        .get("target_agent")
        .or_else(|| object.get("destination"))
        .ok_or("missing required field: target_agent")?;
    let destination = non_empty_str(destination, "target_agent")?;

    let command = object
        .get("command")
        .ok_or("missing required field: command")?
        .as_object()
        .ok_or("command must be an object")?;
    let action = non_empty_str(
        command.get("action").ok_or("missing required command field: action")?,
        "action",
    )?;
    let condition = non_empty_str(
        command
            .get("condition")
            .ok_or("missing required command field: condition")?,
        "condition",
    )?;

    let priority = object
        .get("priority")
        .ok_or("missing required field: priority")?
        .as_i64()
        .ok_or("priority must be an integer")?;

    Ok(Task::new(destination, Command::new(action, condition), priority))
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(format!("{} must not be empty", field)),
        None => Err(format!("{} must be a string", field)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
