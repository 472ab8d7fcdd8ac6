//! `steward threads` — list checkpointed conversation threads.

use steward_checkpoint::FileCheckpointer;
use steward_config::AppConfig;
use steward_core::checkpoint::Checkpointer;
use steward_core::session::SessionPhase;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.checkpoint.backend == "memory" {
        println!("  Checkpoint backend is `memory`; threads are not kept between runs.");
        println!("  Set `backend = \"file\"` under [checkpoint] to save them.");
        println!();
    }

    let store = FileCheckpointer::new(config.checkpoint.resolved_dir());
    let threads = store.list().await?;

    if threads.is_empty() {
        println!("  No saved threads in {}", store.dir().display());
        return Ok(());
    }

    println!("  {:<38} {:>8}  {:<18} {}", "THREAD", "MESSAGES", "STATE", "UPDATED");
    for t in threads {
        let state = match (t.awaiting_approval, t.phase) {
            (true, _) => "awaiting approval",
            (false, SessionPhase::Authenticated) => "authenticated",
            (false, SessionPhase::Unauthenticated) => "-",
        };
        println!(
            "  {:<38} {:>8}  {:<18} {}",
            t.id.as_str(),
            t.messages,
            state,
            t.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
