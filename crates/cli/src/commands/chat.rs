//! Shared chat driver for `steward chef` and `steward email`.
//!
//! Reads user input and approval answers from the same stdin line stream,
//! checkpoints the session after every turn, and resumes threads by id.

use std::io::Write;
use std::sync::Arc;
use steward_agent::{AgentLoop, TurnOutcome};
use steward_config::AppConfig;
use steward_core::approval::{ApprovalDecision, PendingApproval};
use steward_core::checkpoint::Checkpointer;
use steward_core::event::EventBus;
use steward_core::message::ConversationId;
use steward_core::provider::Provider;
use steward_core::session::Session;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

type Input = Lines<BufReader<Stdin>>;
type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load config and fail early with setup instructions if no model key is set.
pub fn load_config() -> CliResult<AppConfig> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY  = 'sk-...'");
        eprintln!("    STEWARD_API_KEY = 'sk-...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    Ok(config)
}

pub fn provider(config: &AppConfig) -> CliResult<Arc<dyn Provider>> {
    let router = steward_providers::build_from_config(config);
    Ok(router.default().ok_or("No default provider configured")?)
}

/// Forward domain events to the debug log.
pub fn log_events(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Run a chat against `agent`: one message with `-m`, otherwise a REPL.
pub async fn run(
    agent: AgentLoop,
    config: &AppConfig,
    title: &str,
    thread: Option<String>,
    message: Option<String>,
) -> CliResult<()> {
    let checkpointer = steward_checkpoint::from_backend(
        &config.checkpoint.backend,
        config.checkpoint.resolved_dir(),
    )?;
    let mut session = open_session(checkpointer.as_ref(), thread).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // A thread saved mid-approval picks up at the prompt.
    if let Some(pending) = session.pending.clone() {
        println!("  Thread {} is waiting for a decision.", session.id);
        let outcome = TurnOutcome::Interrupted(pending);
        if !drive(&agent, &mut session, &mut input, outcome).await? {
            return finish(checkpointer.as_ref(), &session).await;
        }
        checkpointer.save(&session).await?;
    }

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let outcome = agent.send(&mut session, &msg).await;
        eprint!("\r              \r");
        drive(&agent, &mut session, &mut input, outcome?).await?;
        return finish(checkpointer.as_ref(), &session).await;
    }

    println!();
    println!("  {title}");
    println!("  Model:     {}", agent.model());
    println!("  Thread:    {}", session.id);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let outcome = agent.send(&mut session, line).await;
        eprint!("\r     \r");

        let finished = match outcome {
            Ok(outcome) => match drive(&agent, &mut session, &mut input, outcome).await {
                Ok(finished) => finished,
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    true
                }
            },
            Err(e) => {
                eprintln!("  [Error] {e}");
                true
            }
        };
        checkpointer.save(&session).await?;
        if !finished {
            break;
        }
    }

    finish(checkpointer.as_ref(), &session).await
}

async fn open_session(checkpointer: &dyn Checkpointer, thread: Option<String>) -> CliResult<Session> {
    let Some(thread) = thread else {
        return Ok(Session::new());
    };
    let id = ConversationId::from(thread.as_str());
    match checkpointer.load(&id).await? {
        Some(session) => {
            debug!(thread = %id, messages = session.conversation.messages.len(), "Resumed thread");
            Ok(session)
        }
        None => Ok(Session::with_id(id)),
    }
}

async fn finish(checkpointer: &dyn Checkpointer, session: &Session) -> CliResult<()> {
    checkpointer.save(session).await?;
    if checkpointer.name() != "memory" {
        println!();
        println!("  Thread saved: {} (resume with --thread {})", session.id, session.id);
    }
    println!();
    Ok(())
}

/// Print responses and collect approval decisions until the turn completes.
///
/// Returns `false` if stdin closed while a call was waiting; the call stays
/// parked on the session.
async fn drive(
    agent: &AgentLoop,
    session: &mut Session,
    input: &mut Input,
    mut outcome: TurnOutcome,
) -> CliResult<bool> {
    loop {
        match outcome {
            TurnOutcome::Completed { response } => {
                println!();
                for line in response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
                return Ok(true);
            }
            TurnOutcome::Interrupted(pending) => {
                match ask_decision(input, &pending).await? {
                    Some(Answer::Decide(decision)) => {
                        outcome = agent.resume(session, decision).await?;
                    }
                    Some(Answer::Cancel) => {
                        agent.cancel(session)?;
                        println!("  Cancelled `{}`.", pending.call.name);
                        println!();
                        return Ok(true);
                    }
                    None => {
                        println!();
                        println!("  Left `{}` awaiting approval.", pending.call.name);
                        return Ok(false);
                    }
                }
            }
        }
    }
}

enum Answer {
    Decide(ApprovalDecision),
    /// Drop the call without asking the model to continue
    Cancel,
}

async fn ask_decision(input: &mut Input, pending: &PendingApproval) -> CliResult<Option<Answer>> {
    println!();
    println!("  Approval required: {}", pending.describe());

    loop {
        print!("  [a]pprove / [e]dit / [r]eject / [c]ancel > ");
        std::io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };

        match parse_choice(&line) {
            Some(Choice::Approve) => return Ok(Some(Answer::Decide(ApprovalDecision::Approve))),
            Some(Choice::Edit) => {
                let current = serde_json::to_string(&pending.arguments())?;
                println!("  Current arguments: {current}");
                print!("  New arguments (JSON) > ");
                std::io::stdout().flush()?;
                let Some(line) = input.next_line().await? else {
                    return Ok(None);
                };
                match parse_arguments(&line) {
                    Ok(arguments) => {
                        return Ok(Some(Answer::Decide(ApprovalDecision::Edit { arguments })));
                    }
                    Err(e) => println!("  {e}"),
                }
            }
            Some(Choice::Reject) => {
                print!("  Reason (optional) > ");
                std::io::stdout().flush()?;
                let reason = input
                    .next_line()
                    .await?
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
                return Ok(Some(Answer::Decide(ApprovalDecision::Reject { reason })));
            }
            Some(Choice::Cancel) => return Ok(Some(Answer::Cancel)),
            None => println!("  Please answer approve, edit, reject or cancel."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Approve,
    Edit,
    Reject,
    Cancel,
}

fn parse_choice(line: &str) -> Option<Choice> {
    match line.trim().to_ascii_lowercase().as_str() {
        "a" | "approve" | "y" | "yes" => Some(Choice::Approve),
        "e" | "edit" => Some(Choice::Edit),
        "r" | "reject" | "n" | "no" => Some(Choice::Reject),
        "c" | "cancel" => Some(Choice::Cancel),
        _ => None,
    }
}

fn parse_arguments(line: &str) -> Result<serde_json::Value, String> {
    match serde_json::from_str::<serde_json::Value>(line.trim()) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err("Arguments must be a JSON object.".into()),
        Err(e) => Err(format!("Invalid JSON: {e}")),
    }
}
