//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use backoffice_orchestrator::orchestrator::capability::DestinationCapability;
use backoffice_orchestrator::orchestrator::completion::{ScriptedCompletion, TextCompletionPort};
use backoffice_orchestrator::orchestrator::handler::{
    Handler, HandlerConfig, HandlerError, HandlerRequest, HandlerResponse,
};
use backoffice_orchestrator::orchestrator::registry::{DestinationRegistry, DestinationRegistryBuilder};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a test handler does when invoked
#[derive(Clone)]
pub enum Behavior {
    /// Return this text
    Text(String),
    /// Return this value
    Structured(Value),
    /// Fail with this message
    Fail(String),
    /// Panic
    Panic,
}

/// Handler that records every request it receives
pub struct RecordingHandler {
    name: String,
    behavior: Behavior,
    requests: Arc<Mutex<Vec<HandlerRequest>>>,
}

#[async_trait]
impl Handler for RecordingHandler {
    fn handler_type(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
        self.requests.lock().await.push(request);
        match &self.behavior {
            Behavior::Text(text) => Ok(HandlerResponse::Text(text.clone())),
            Behavior::Structured(value) => Ok(HandlerResponse::Structured(value.clone())),
            Behavior::Fail(message) => Err(HandlerError::Invocation(message.clone())),
            Behavior::Panic => panic!("handler {} exploded", self.name),
        }
    }
}

/// Requests received by one destination
pub type Recorder = Arc<Mutex<Vec<HandlerRequest>>>;

/// Capability stub for a test destination
pub fn capability(name: &str) -> DestinationCapability {
    DestinationCapability {
        agent_type: name.to_string(),
        description: format!("{} test destination", name),
        primary_domains: vec![],
        key_functions: vec![],
        example_commands: vec![],
        collaboration_needs: vec![],
    }
}

/// Register a recording destination and return its recorder
pub fn with_recording(
    builder: DestinationRegistryBuilder,
    name: &str,
    behavior: Behavior,
) -> (DestinationRegistryBuilder, Recorder) {
    let requests: Recorder = Arc::new(Mutex::new(Vec::new()));
    let recorder = requests.clone();
    let handler_name = name.to_string();
    let builder = builder.register(name, capability(name), move |_| {
        Ok(Arc::new(RecordingHandler {
            name: handler_name.clone(),
            behavior: behavior.clone(),
            requests: requests.clone(),
        }) as Arc<dyn Handler>)
    });
    (builder, recorder)
}

/// Completion port answering every call with `response`
pub fn scripted(response: &str) -> Arc<dyn TextCompletionPort> {
    Arc::new(ScriptedCompletion::new(response))
}

/// Freeze a builder with a throwaway completion port
pub fn build(builder: DestinationRegistryBuilder) -> Arc<DestinationRegistry> {
    Arc::new(builder.build(HandlerConfig::new(scripted("{}"))))
}

/// JSON array of extracted tasks as the model would return it
pub fn task_json(tasks: &[(&str, &str, &str, i64)]) -> String {
    let records: Vec<Value> = tasks
        .iter()
        .map(|(destination, action, condition, priority)| {
            serde_json::json!({
                "target_agent": destination,
                "command": {"action": action, "condition": condition},
                "priority": priority,
            })
        })
        .collect();
    Value::Array(records).to_string()
}
