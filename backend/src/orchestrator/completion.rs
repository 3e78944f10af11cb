//! Text completion port
//!
//! The only seam between the orchestrator and a language model. The core
//! never trusts what comes back: every caller parses defensively.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// A single completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction describing the task
    pub system: String,
    /// User-side content
    pub prompt: String,
    /// Model override; `None` uses the port's default model
    pub model: Option<String>,
    /// Ask the model for a JSON response body
    pub force_json: bool,
}

impl CompletionRequest {
    /// Create a request with no model override and free-form output
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            model: None,
            force_json: false,
        }
    }

    /// Set the model override
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Request a JSON response body
    pub fn json(mut self) -> Self {
        self.force_json = true;
        self
    }
}

/// Errors raised by a completion port
#[derive(Error, Debug)]
pub enum CompletionError {
    /// No API key configured
    #[error("API key is empty")]
    MissingApiKey,

    /// Transport failure before a response was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Provider rejected the request with a rate limit
    #[error("rate limit exceeded (HTTP {status}): {body}")]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Provider returned a non-success status
    #[error("provider returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Provider refused to answer the prompt
    #[error("provider blocked the prompt: {0}")]
    Blocked(String),

    /// Response body could not be understood
    #[error("Failed to parse JSON response: {0}")]
    Malformed(String),

    /// Response contained no text
    #[error("response contained no text: {0}")]
    Empty(String),
}

/// Given a prompt, return text
///
/// Implementations may use any transport. Output is not guaranteed to match
/// whatever format the prompt asked for.
#[async_trait]
pub trait TextCompletionPort: Send + Sync {
    /// Complete a request
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

#[async_trait]
impl TextCompletionPort for Arc<dyn TextCompletionPort> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}

/// Scripted completion port for tests and local runs
///
/// Returns queued responses in order, repeating the last one once the queue
/// is down to a single entry. Records every request it receives.
pub struct ScriptedCompletion {
    responses: Mutex<Vec<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    /// Always answer with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self::sequence(vec![Ok(response.into())])
    }

    /// Always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::sequence(vec![Err(message.into())])
    }

    /// Answer with each entry in turn; `Err` entries become HTTP errors
    pub fn sequence(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl TextCompletionPort for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().await.push(request);

        let mut responses = self.responses.lock().await;
        let next = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses
                .first()
                .cloned()
                .unwrap_or_else(|| Err("no scripted response".to_string()))
        };
        next.map_err(CompletionError::Http)
    }
}
