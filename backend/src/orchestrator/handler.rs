//! Destination handler interface
//!
//! Every registered destination implements [`Handler`]. Handlers are built
//! by factories in the destination registry from a shared [`HandlerConfig`].

use crate::orchestrator::completion::{CompletionError, TextCompletionPort};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Input for one destination invocation
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerRequest {
    /// Integrated instruction built from the destination's commands
    pub instruction: String,
    /// The user's original utterance
    pub original_input: String,
    /// Session identifier, if any
    pub session_id: Option<String>,
    /// User identifier, if any
    pub user_id: Option<String>,
    /// Raw result of the previous successful destination (or the caller's
    /// initial context for the first one)
    pub shared_context: Option<Value>,
}

/// What a handler returns
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResponse {
    /// Free text; JSON is attempted before it is wrapped
    Text(String),
    /// Already structured payload
    Structured(Value),
}

/// Errors raised while building or invoking a handler
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Factory could not build the handler
    #[error("handler construction failed: {0}")]
    Construction(String),

    /// Handler ran and failed
    #[error("{0}")]
    Invocation(String),

    /// Handler's model call failed
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    /// Handler task panicked or was cancelled
    #[error("handler aborted: {0}")]
    Aborted(String),
}

/// A downstream task-handling service
#[async_trait]
pub trait Handler: Send + Sync {
    /// Type name recorded in distribution results
    fn handler_type(&self) -> &str;

    /// Execute an integrated instruction
    async fn invoke(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError>;
}

/// Orchestration-wide settings passed to every handler factory
#[derive(Clone)]
pub struct HandlerConfig {
    /// Completion port shared with the extractor
    pub completion: Arc<dyn TextCompletionPort>,
    /// Model override for handler calls
    pub model: Option<String>,
    /// Log prompts and responses inside handlers
    pub tracing_enabled: bool,
}

impl HandlerConfig {
    /// Create a config with no model override and tracing off
    pub fn new(completion: Arc<dyn TextCompletionPort>) -> Self {
        Self {
            completion,
            model: None,
            tracing_enabled: false,
        }
    }
}

impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("model", &self.model)
            .field("tracing_enabled", &self.tracing_enabled)
            .finish_non_exhaustive()
    }
}

/// Builds a handler for one destination
pub type HandlerFactory =
    Arc<dyn Fn(&HandlerConfig) -> Result<Arc<dyn Handler>, HandlerError> + Send + Sync>;
