//! `steward status` — Show effective configuration (no secrets).

use steward_config::AppConfig;

fn presence(value: bool) -> &'static str {
    if value { "configured" } else { "missing" }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Steward Status");
    println!("==============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    match config.default_temperature {
        Some(t) => println!("  Temperature:  {t}"),
        None => println!("  Temperature:  provider default"),
    }
    println!("  Max steps:    {}", config.max_tool_iterations);
    println!("  API key:      {}", presence(config.has_api_key()));
    println!(
        "  Search:       {} ({}, depth {}, {} results)",
        presence(config.search.api_key.is_some()),
        config.search.api_url,
        config.search.search_depth,
        config.search.max_results
    );
    println!("  Email login:  {}", config.email.address);
    println!("  Checkpoints:  {} ({})", config.checkpoint.backend, config.checkpoint.resolved_dir().display());

    let policy = config.approval_policy();
    let gated: Vec<&str> = policy
        .entries()
        .filter(|(_, needs)| *needs)
        .map(|(name, _)| name)
        .collect();
    println!(
        "  Approval:     {}",
        if gated.is_empty() { "none".to_string() } else { gated.join(", ") }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `steward onboard` first");
    }

    Ok(())
}
