//! Command-line interface definition and dispatch for tether.
//!
//! Uses [`clap`] for argument parsing with derive macros. With no subcommand
//! tether starts an interactive chat.

use crate::{agent::Agent, chat, config, message::History, output, provider, remote, tools};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

/// Top-level CLI structure for tether.
#[derive(Parser, Debug)]
#[command(
    name = "tether",
    about = "A terminal agent that drives a remote desktop through tool calls"
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands. `///` comments double as `--help` text.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat(SessionArgs),
    /// Send one message, run any tool calls, and exit
    Ask {
        /// The message to send
        prompt: Vec<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides of the loaded config.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct SessionArgs {
    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,
    /// SSH host of the desktop (overrides config and COMPUTER_USE_SSH_HOST)
    #[arg(long)]
    pub host: Option<String>,
    /// X display number on the desktop
    #[arg(long)]
    pub display: Option<u32>,
}

impl SessionArgs {
    fn apply(self, config: &mut config::Config) {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(host) = self.host {
            config.remote.host = Some(host).filter(|h| !h.is_empty());
        }
        if let Some(display) = self.display {
            config.remote.display_number = display;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config with secrets masked
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Wires the model client, remote executor, and tools into an [`Agent`].
fn build_agent(config: &config::Config) -> Result<Agent> {
    let client = provider::AnthropicClient::from_config(config)?;
    let executor = Arc::new(remote::CommandExecutor::from_config(&config.remote));
    tracing::info!(
        via = ?executor.target(),
        display = config.remote.display_number,
        "remote desktop target"
    );
    let tools = tools::ToolRegistry::with_builtins(config, executor);
    let system = config.system_prompt_at(chrono::Local::now());

    Ok(Agent::new(
        Box::new(client),
        tools,
        config.model.clone(),
        system,
        config.max_tokens,
    )
    .with_max_tool_rounds(config.agent.max_tool_rounds))
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Chat(SessionArgs::default()));

    match command {
        Commands::Chat(args) => {
            let mut config = config::Config::load()?;
            args.apply(&mut config);
            let agent = build_agent(&config)?;
            chat::run_chat(agent).await
        }
        Commands::Ask { prompt, session } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: tether ask \"your message here\"");
            }

            let mut config = config::Config::load()?;
            session.apply(&mut config);
            let agent = build_agent(&config)?;

            println!(
                "{} [model: {}]",
                "tether".bold().cyan(),
                agent.model_name().yellow()
            );
            println!();
            println!("{} {}", "You:".green().bold(), prompt);

            let mut history = History::new();
            history.push_user_text(prompt);
            let mut renderer = output::StdoutRenderer::new();
            let summary = agent.respond(&mut history, &mut renderer).await?;

            println!();
            println!(
                "{}",
                format!(
                    "[{} model calls, {} tool calls, {} in / {} out tokens]",
                    summary.model_calls,
                    summary.tool_calls,
                    summary.usage.input_tokens,
                    summary.usage.output_tokens
                )
                .dimmed()
            );
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = config::Config::load()?;
                let path = config::Config::config_path()?;
                println!("{} {}", "Config path:".bold(), path.display());
                println!();
                let toml_str = toml::to_string_pretty(&config.masked())?;
                println!("{}", toml_str);
                Ok(())
            }
        },
    }
}
