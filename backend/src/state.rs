//! Application state
//!
//! Shared by all HTTP handlers as `Arc<RwLock<AppState>>`. Holds the active
//! configuration and the pipeline built from it.

use crate::destinations::default_registry;
use crate::orchestrator::completion::TextCompletionPort;
use crate::orchestrator::config::{OrchestratorConfig, DEFAULT_DESTINATION};
use crate::orchestrator::handler::HandlerConfig;
use crate::orchestrator::pipeline::Orchestrator;
use crate::orchestrator::registry::DestinationRegistry;
use std::sync::Arc;

/// Server-wide state
pub struct AppState {
    /// Active orchestrator configuration
    pub config: OrchestratorConfig,
    /// Completion port shared by extraction and handlers
    pub completion: Arc<dyn TextCompletionPort>,
    /// Pipeline built from `config`
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Build state with the built-in destinations
    pub fn new(config: OrchestratorConfig, completion: Arc<dyn TextCompletionPort>) -> Self {
        let registry = Arc::new(default_registry(handler_config(&config, &completion)));
        Self::with_registry(config, completion, registry)
    }

    /// Build state around a custom destination table
    ///
    /// An unregistered `default_destination` is replaced with a registered one.
    pub fn with_registry(
        mut config: OrchestratorConfig,
        completion: Arc<dyn TextCompletionPort>,
        registry: Arc<DestinationRegistry>,
    ) -> Self {
        if !registry.contains(&config.default_destination) {
            let replacement = if registry.contains(DEFAULT_DESTINATION) {
                Some(DEFAULT_DESTINATION.to_string())
            } else {
                registry.registrations().first().map(|r| r.name.clone())
            };
            if let Some(replacement) = replacement {
                tracing::warn!(
                    configured = %config.default_destination,
                    using = %replacement,
                    "Default destination is not registered"
                );
                config.default_destination = replacement;
            }
        }
        let orchestrator = Arc::new(Orchestrator::new(&config, completion.clone(), registry));
        Self {
            config,
            completion,
            orchestrator,
        }
    }

    /// Replace the configuration and rebuild the pipeline
    ///
    /// The destination table is kept. Handlers are rebuilt with the new model
    /// and tracing settings, so every session's cached handlers are dropped.
    pub fn apply_config(&mut self, config: OrchestratorConfig) {
        let registry = Arc::new(
            self.orchestrator
                .registry()
                .rebuild(handler_config(&config, &self.completion)),
        );
        self.orchestrator = Arc::new(Orchestrator::new(&config, self.completion.clone(), registry));
        self.config = config;
        tracing::info!(
            model = %self.config.gemini_model,
            default_destination = %self.config.default_destination,
            handler_tracing = self.config.handler_tracing,
            "Orchestrator configuration applied"
        );
    }
}

fn handler_config(config: &OrchestratorConfig, completion: &Arc<dyn TextCompletionPort>) -> HandlerConfig {
    HandlerConfig {
        completion: completion.clone(),
        model: Some(config.gemini_model.clone()),
        tracing_enabled: config.handler_tracing,
    }
}
