//! `steward chef` — recipe ideas from leftover ingredients.

use super::chat;
use std::sync::Arc;
use steward_agent::chef_agent;
use steward_core::event::EventBus;
use steward_tools::TavilySearch;

pub async fn run(
    message: Option<String>,
    thread: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = chat::load_config()?;

    let Some(search_key) = config.search.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No search API key configured!");
        eprintln!();
        eprintln!("  Set TAVILY_API_KEY or add `api_key` under [search] in:");
        eprintln!("    {}", steward_config::AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No search API key found.".into());
    };

    let provider = chat::provider(&config)?;
    let search = Arc::new(TavilySearch::from_config(search_key, &config.search));
    let event_bus = Arc::new(EventBus::default());
    chat::log_events(&event_bus);

    let agent = chef_agent(provider, &config, search, event_bus);
    chat::run(agent, &config, "Steward Personal Chef", thread, message).await
}
