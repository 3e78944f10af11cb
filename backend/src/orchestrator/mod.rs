//! Orchestrator module
//!
//! The task decomposition pipeline: a user utterance is turned into routed,
//! prioritized tasks by a language model, grouped per destination, and
//! executed destination by destination with results threaded forward.
//!
//! The stages are usable on their own ([`extractor`], [`grouper`],
//! [`distributor`]) or composed through [`pipeline::Orchestrator`].

pub mod api_client;
pub mod capability;
pub mod completion;
pub mod config;
pub mod distributor;
pub mod extractor;
pub mod gemini_types;
pub mod grouper;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod types;
pub mod utils;

pub use completion::{CompletionError, CompletionRequest, TextCompletionPort};
pub use handler::{Handler, HandlerConfig, HandlerError, HandlerRequest, HandlerResponse};
pub use pipeline::{OrchestrationOutcome, OrchestrationRequest, Orchestrator, PlanPreview};
pub use registry::DestinationRegistry;
