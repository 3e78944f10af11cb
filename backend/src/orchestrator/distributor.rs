//! Task distribution
//!
//! Executes a [`GroupedTaskMap`] one destination at a time, in map order.
//! Each destination receives a single integrated instruction covering all of
//! its commands, prefixed with a digest of what earlier destinations
//! produced, plus the full result of the previous successful destination as
//! shared context.

use crate::orchestrator::handler::{HandlerError, HandlerRequest, HandlerResponse};
use crate::orchestrator::registry::DestinationRegistry;
use crate::orchestrator::types::{
    Command, DestinationMap, DestinationStatus, DistributedTask, DistributionResult,
    GroupedTaskMap, DEFAULT_RESULT_MESSAGE,
};
use crate::orchestrator::utils::truncate_for_log;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::Instrument;

const LOG_PREVIEW_CHARS: usize = 300;

/// Drives grouped commands through their destination handlers
#[derive(Clone)]
pub struct TaskDistributor {
    registry: Arc<DestinationRegistry>,
}

impl TaskDistributor {
    /// Create a distributor resolving handlers through `registry`
    pub fn new(registry: Arc<DestinationRegistry>) -> Self {
        Self { registry }
    }

    /// Run every destination in `grouped`, strictly sequentially
    ///
    /// A destination that cannot be resolved, or whose handler fails, is
    /// recorded in `errors` and the loop moves on. Never fails.
    ///
    /// # Arguments
    /// * `grouped` - Commands per destination, in execution order
    /// * `original_utterance` - The user's request, forwarded to every handler
    /// * `session_id` / `user_id` - Forwarded to handlers and used as cache scope
    /// * `initial_context` - Shared context for the first destination
    pub async fn distribute(
        &self,
        grouped: &GroupedTaskMap,
        original_utterance: &str,
        session_id: Option<&str>,
        user_id: Option<&str>,
        initial_context: Option<Value>,
    ) -> DistributionResult {
        let mut result = DistributionResult::empty(grouped.len());
        let mut shared_context = initial_context;

        tracing::info!(
            destination_count = grouped.len(),
            session_id = ?session_id,
            user_id = ?user_id,
            "Distributing grouped tasks"
        );

        for (destination, commands) in grouped.iter() {
            tracing::info!(
                destination = %destination,
                command_count = commands.len(),
                "Dispatching to destination"
            );

            let Some(handler) = self
                .registry
                .get_or_create(destination, user_id, session_id)
                .await
            else {
                let error = format!("{} not found", destination);
                tracing::error!(destination = %destination, "{}", error);
                result.errors.push(error);
                continue;
            };

            let instruction = integrate_commands(commands, &result.previous_results);
            tracing::debug!(
                destination = %destination,
                instruction = %truncate_for_log(&instruction, LOG_PREVIEW_CHARS),
                "Integrated instruction"
            );

            let request = HandlerRequest {
                instruction: instruction.clone(),
                original_input: original_utterance.to_string(),
                session_id: session_id.map(str::to_string),
                user_id: user_id.map(str::to_string),
                shared_context: shared_context.clone(),
            };
            let handler_type = handler.handler_type().to_string();

            // Spawned so a panicking handler surfaces as a JoinError
            let invocation =
                tokio::spawn(async move { handler.invoke(request).await }.in_current_span());
            let outcome = match invocation.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(HandlerError::Aborted(join_error.to_string())),
            };

            match outcome {
                Ok(response) => {
                    let normalized = normalize_response(response);
                    tracing::info!(
                        destination = %destination,
                        handler_type = %handler_type,
                        "Destination executed"
                    );

                    result.distributed_tasks.insert(
                        destination,
                        DistributedTask {
                            commands: commands.clone(),
                            integrated_instruction: instruction,
                            handler_type,
                            status: DestinationStatus::Executed,
                        },
                    );
                    result
                        .execution_results
                        .insert(destination, normalized.clone());
                    result
                        .previous_results
                        .insert(destination, normalized.clone());
                    result.last_execution_result = Some(normalized.clone());
                    result.successful_count += 1;
                    shared_context = Some(normalized);
                }
                Err(e) => {
                    let error = format!("{} execution error: {}", destination, e);
                    tracing::error!(
                        destination = %destination,
                        handler_type = %handler_type,
                        error = %e,
                        "Destination failed"
                    );

                    result.distributed_tasks.insert(
                        destination,
                        DistributedTask {
                            commands: commands.clone(),
                            integrated_instruction: instruction,
                            handler_type,
                            status: DestinationStatus::Failed,
                        },
                    );
                    result.errors.push(error);
                    result.failed_count += 1;
                }
            }
        }

        tracing::info!(
            total_destinations = result.total_destinations,
            successful_count = result.successful_count,
            failed_count = result.failed_count,
            error_count = result.errors.len(),
            "Distribution finished"
        );

        result
    }
}

/// Build the instruction sent to one destination
///
/// Prior results (if any) are summarized one line per destination, then the
/// commands follow: a single command as `action: condition`, several as a
/// numbered list.
pub fn integrate_commands(commands: &[Command], previous_results: &DestinationMap<Value>) -> String {
    if commands.is_empty() {
        return "No tasks to execute".to_string();
    }

    let body = match commands {
        [single] => single.render(),
        many => {
            let steps = many
                .iter()
                .enumerate()
                .map(|(i, command)| format!("{}. {}", i + 1, command.render()))
                .collect::<Vec<_>>()
                .join("\n");
            format!("Execute the following tasks in sequence:\n{}", steps)
        }
    };

    if previous_results.is_empty() {
        return body;
    }

    let context = previous_results
        .iter()
        .map(|(destination, result)| format!("- {}: {}", destination, summarize_result(result)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Results of previous tasks:\n{}\n\nBased on the above results, perform the following task(s):\n{}",
        context, body
    )
}

fn summarize_result(result: &Value) -> String {
    match result {
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => DEFAULT_RESULT_MESSAGE.to_string(),
        },
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Turn a handler response into a JSON object carrying a `message`
///
/// Text is parsed as JSON when possible; text that is not a JSON object is
/// wrapped as `{"message": text, "raw_response": true}`. Objects without a
/// `message` get one from `response_message`, else the last entry of
/// `messages`, else [`DEFAULT_RESULT_MESSAGE`].
pub fn normalize_response(response: HandlerResponse) -> Value {
    match response {
        HandlerResponse::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(fields)) => Value::Object(ensure_message(fields)),
            _ => raw_text(text),
        },
        HandlerResponse::Structured(Value::Object(fields)) => Value::Object(ensure_message(fields)),
        HandlerResponse::Structured(Value::String(text)) => raw_text(text),
        HandlerResponse::Structured(other) => raw_text(other.to_string()),
    }
}

fn raw_text(text: String) -> Value {
    json!({ "message": text, "raw_response": true })
}

fn ensure_message(mut fields: Map<String, Value>) -> Map<String, Value> {
    if fields.contains_key("message") {
        return fields;
    }

    let message = fields
        .get("response_message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| last_message(&fields))
        .unwrap_or_else(|| DEFAULT_RESULT_MESSAGE.to_string());

    fields.insert("message".to_string(), Value::String(message));
    fields
}

fn last_message(fields: &Map<String, Value>) -> Option<String> {
    let last = fields.get("messages")?.as_array()?.last()?;
    match last {
        Value::String(text) => Some(text.clone()),
        Value::Object(entry) => entry
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
