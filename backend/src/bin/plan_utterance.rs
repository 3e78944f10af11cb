//! Utility binary for checking how an utterance would be planned
//! This is a utility binary, not part of the main application
//!
//! Usage: plan_utterance "Search for coffee products and update their inventory"

use backoffice_orchestrator::orchestrator::api_client::{GeminiClient, API_KEY_ENV};
use backoffice_orchestrator::orchestrator::completion::TextCompletionPort;
use backoffice_orchestrator::orchestrator::config::OrchestratorConfig;
use backoffice_orchestrator::state::AppState;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let utterance = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if utterance.trim().is_empty() {
        anyhow::bail!("usage: plan_utterance <utterance>");
    }

    let config = OrchestratorConfig::from_env();
    println!("Model: {}", config.gemini_model);
    println!("Default destination: {}", config.default_destination);

    let client = GeminiClient::from_env(&config)?;
    if !client.has_api_key() {
        eprintln!("{} is not set; the fallback plan will be shown", API_KEY_ENV);
    }
    let completion: Arc<dyn TextCompletionPort> = Arc::new(client);
    let state = AppState::new(config, completion);

    let preview = state.orchestrator.plan(&utterance, None, None).await;

    println!("\nTasks ({}):", preview.tasks.len());
    for (i, task) in preview.tasks.iter().enumerate() {
        println!(
            "  {}. [p{}] {} -> {}",
            i + 1,
            task.priority,
            task.command.render(),
            task.destination
        );
    }

    println!("\nGrouped ({} destinations):", preview.grouped.len());
    for (destination, commands) in preview.grouped.iter() {
        println!("  {}:", destination);
        for command in commands {
            println!("    - {}", command.render());
        }
    }

    Ok(())
}
