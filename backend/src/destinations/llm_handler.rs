//! Language-model-backed destination handler
//!
//! Sends the integrated instruction, the user's original request and the
//! shared context to the completion port under a destination-specific system
//! prompt. The model's JSON (or text) answer is returned as-is; the
//! distributor normalizes it.

use crate::orchestrator::completion::{CompletionRequest, TextCompletionPort};
use crate::orchestrator::handler::{Handler, HandlerConfig, HandlerError, HandlerRequest, HandlerResponse};
use crate::orchestrator::utils::{locate_json_payload, strip_reasoning, truncate_for_log};
use async_trait::async_trait;
use std::sync::Arc;

const TRACE_PREVIEW_CHARS: usize = 1000;

/// Handler that delegates a destination's work to a language model
pub struct LlmDestinationHandler {
    handler_type: String,
    system_prompt: String,
    completion: Arc<dyn TextCompletionPort>,
    model: Option<String>,
    tracing_enabled: bool,
}

impl LlmDestinationHandler {
    /// Build a handler from the shared handler config
    pub fn new(
        handler_type: impl Into<String>,
        system_prompt: impl Into<String>,
        config: &HandlerConfig,
    ) -> Self {
        Self {
            handler_type: handler_type.into(),
            system_prompt: system_prompt.into(),
            completion: config.completion.clone(),
            model: config.model.clone(),
            tracing_enabled: config.tracing_enabled,
        }
    }

    fn build_prompt(request: &HandlerRequest) -> String {
        let context = match &request.shared_context {
            Some(context) => {
                serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string())
            }
            None => "none".to_string(),
        };

        format!(
            "Instruction:\n{}\n\nOriginal user request:\n{}\n\nResult of the previous step (JSON):\n{}",
            request.instruction, request.original_input, context
        )
    }
}

#[async_trait]
impl Handler for LlmDestinationHandler {
    fn handler_type(&self) -> &str {
        &self.handler_type
    }

    async fn invoke(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
        let prompt = Self::build_prompt(&request);
        if self.tracing_enabled {
            tracing::info!(
                handler_type = %self.handler_type,
                session_id = ?request.session_id,
                prompt = %truncate_for_log(&prompt, TRACE_PREVIEW_CHARS),
                "Handler prompt"
            );
        }

        let completion = CompletionRequest::new(self.system_prompt.clone(), prompt)
            .with_model(self.model.clone())
            .json();
        let raw = self.completion.complete(completion).await?;

        let (cleaned, thoughts) = strip_reasoning(&raw);
        if let Some(thoughts) = thoughts {
            tracing::debug!(
                handler_type = %self.handler_type,
                thoughts = %truncate_for_log(&thoughts, TRACE_PREVIEW_CHARS),
                "Handler reasoning segment"
            );
        }
        let payload = locate_json_payload(&cleaned).to_string();

        if self.tracing_enabled {
            tracing::info!(
                handler_type = %self.handler_type,
                response = %truncate_for_log(&payload, TRACE_PREVIEW_CHARS),
                "Handler response"
            );
        }

        if payload.is_empty() {
            return Err(HandlerError::Invocation(format!(
                "{} returned an empty response",
                self.handler_type
            )));
        }

        Ok(HandlerResponse::Text(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::completion::ScriptedCompletion;
    use serde_json::json;

    fn request() -> HandlerRequest {
        HandlerRequest {
            instruction: "search_product: name contains 'coffee'".to_string(),
            original_input: "find coffee".to_string(),
            session_id: Some("s1".to_string()),
            user_id: None,
            shared_context: Some(json!({"message": "previous"})),
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_fenced_payload() {
        let port = Arc::new(ScriptedCompletion::new(
            "<think>look up coffee</think>```json\n{\"message\": \"3 products\"}\n```",
        ));
        let mut config = HandlerConfig::new(port.clone());
        config.model = Some("gemini-test".to_string());
        let handler = LlmDestinationHandler::new("Products", "You manage products.", &config);

        let response = handler.invoke(request()).await.unwrap();
        assert_eq!(
            response,
            HandlerResponse::Text("{\"message\": \"3 products\"}".to_string())
        );

        let sent = port.requests().await;
        assert_eq!(sent[0].system, "You manage products.");
        assert_eq!(sent[0].model.as_deref(), Some("gemini-test"));
        assert!(sent[0].force_json);
        assert!(sent[0].prompt.contains("search_product: name contains 'coffee'"));
        assert!(sent[0].prompt.contains("find coffee"));
        assert!(sent[0].prompt.contains("\"message\": \"previous\""));
    }

    #[tokio::test]
    async fn test_invoke_without_context() {
        let port = Arc::new(ScriptedCompletion::new("done"));
        let handler = LlmDestinationHandler::new("Orders", "sys", &HandlerConfig::new(port.clone()));

        let mut req = request();
        req.shared_context = None;
        handler.invoke(req).await.unwrap();

        assert!(port.requests().await[0].prompt.ends_with("(JSON):\nnone"));
    }

    #[tokio::test]
    async fn test_invoke_propagates_completion_error() {
        let port = Arc::new(ScriptedCompletion::failing("quota"));
        let handler = LlmDestinationHandler::new("Orders", "sys", &HandlerConfig::new(port));

        let err = handler.invoke(request()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Completion(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_answer() {
        let port = Arc::new(ScriptedCompletion::new("<think>hmm</think>   "));
        let handler = LlmDestinationHandler::new("Orders", "sys", &HandlerConfig::new(port));
        assert!(matches!(
            handler.invoke(request()).await,
            Err(HandlerError::Invocation(_))
        ));
    }
}
