//! Back-office Orchestrator Library
//!
//! Decomposes a free-form administrative command into routed, prioritized
//! tasks and executes them against destination handlers.
//! The server binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod destinations;
pub mod error;
pub mod orchestrator;
pub mod state;
