//! Steward CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Initialize config
//! - `status`   — Show effective configuration
//! - `chef`     — Chat with the personal chef
//! - `email`    — Chat with the email assistant (authentication + approvals)
//! - `threads`  — List saved conversation threads

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "steward",
    about = "Steward — tool-using assistants with gated capabilities and human approval",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Show effective configuration
    Status,

    /// Get recipe ideas for leftover ingredients
    Chef {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Resume or name a conversation thread
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Check the inbox and reply, after signing in
    Email {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Resume or name a conversation thread
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// List saved conversation threads
    Threads,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Chef { message, thread } => commands::chef::run(message, thread).await?,
        Commands::Email { message, thread } => commands::email::run(message, thread).await?,
        Commands::Threads => commands::threads::run().await?,
    }

    Ok(())
}
