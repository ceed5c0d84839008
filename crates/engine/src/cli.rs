//! `compass` command line — config inspection and an interactive chat
//! REPL that drives the turn API locally.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use cc_domain::config::{Config, ConfigSeverity};
use cc_providers::{LlmClient, OpenAiCompatClient, ScriptedClient};
use cc_state::JsonStateStore;

use crate::review::ReviewDecision;
use crate::turn::{Orchestrator, TurnResult};

#[derive(Parser)]
#[command(name = "compass", about = "Multi-agent climate career guidance orchestrator")]
pub struct Cli {
    /// Path to config.toml (defaults are used when absent).
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive chat session against the configured provider.
    Chat {
        /// Use the offline scripted provider instead of a live LLM.
        #[arg(long)]
        scripted: bool,
        /// User id for the session.
        #[arg(long, default_value = "local")]
        user: String,
        /// Conversation id; a fresh UUID when omitted.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Config helpers.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print the version.
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate the config file and report issues.
    Validate,
    /// Print the effective (merged) configuration.
    Show,
}

/// Load config and log validation issues; errors abort.
pub fn load_config(path: &PathBuf) -> anyhow::Result<Arc<Config>> {
    let config = Config::load(path)?;
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!("config validation failed");
    }
    Ok(Arc::new(config))
}

pub fn validate(config: &Config) -> bool {
    let issues = config.validate();
    if issues.is_empty() {
        println!("config OK");
        return true;
    }
    for issue in &issues {
        let tag = match issue.severity {
            ConfigSeverity::Warning => "warning",
            ConfigSeverity::Error => "error",
        };
        println!("{tag}: {issue}");
    }
    !issues.iter().any(|i| i.severity == ConfigSeverity::Error)
}

pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("failed to render config: {e}"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat REPL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(
    config: Arc<Config>,
    scripted: bool,
    user: String,
    conversation: Option<String>,
) -> anyhow::Result<()> {
    let store = Arc::new(JsonStateStore::new(&config.state_store.path)?);

    let llm: Arc<dyn LlmClient> = if scripted {
        Arc::new(ScriptedClient::echo())
    } else {
        Arc::new(OpenAiCompatClient::from_config(&config.llm)?)
    };

    let orchestrator = Orchestrator::builder(config, store, llm).build();
    let conversation_id = conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    println!("conversation {conversation_id} — /quit to exit");

    let mut editor = rustyline::DefaultEditor::new()?;
    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        let _ = editor.add_history_entry(line);

        let mut result = orchestrator.run_turn(&user, &conversation_id, line).await?;

        // Review loop: a pending interrupt needs a decision before the
        // turn can finish.
        loop {
            let request = match &result {
                TurnResult::AwaitingHuman(_, request) if !request.review_options.is_empty() => {
                    request.clone()
                }
                _ => break,
            };
            println!("review requested ({}): {}", request.priority, request.question);
            for reason in &request.reasons {
                println!("  - {reason}");
            }
            println!("options: {}", request.review_options.join(", "));

            let answer = editor.readline("review> ")?;
            let answer = answer.trim();
            let (option, feedback) = match answer.split_once(' ') {
                Some((option, feedback)) => (option, Some(feedback)),
                None => (answer, None),
            };
            match ReviewDecision::from_option(option, feedback) {
                Some(decision) => {
                    result = orchestrator.resume_turn(&conversation_id, decision).await?;
                }
                None => println!("unknown option '{option}'"),
            }
        }

        print_turn(&result);
        if matches!(result, TurnResult::Completed(_)) {
            println!("(conversation complete)");
            break;
        }
    }
    Ok(())
}

/// Print the assistant messages a turn appended.
fn print_turn(result: &TurnResult) {
    let state = result.state();
    // Walk back to the last user message; everything after it is new.
    let start = state
        .messages
        .iter()
        .rposition(|m| m.role == cc_domain::Role::User)
        .map(|i| i + 1)
        .unwrap_or(0);
    for msg in &state.messages[start..] {
        if msg.role == cc_domain::Role::Assistant {
            let agent = msg.metadata.agent.as_deref().unwrap_or("assistant");
            println!("{agent}> {}", msg.content);
        }
    }
    if let TurnResult::AwaitingHuman(_, request) = result {
        if request.review_options.is_empty() {
            println!("(escalated to a human specialist — priority {})", request.priority);
        }
    }
}
