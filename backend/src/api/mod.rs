//! API module
//!
//! HTTP request handlers over the orchestration pipeline

pub mod orchestrator;
