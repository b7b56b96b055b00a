//! Interactive chat session for tether.
//!
//! Reads lines through a [`Console`], handles the `exit`/`reset`/`log`
//! directives, and hands every other line to the [`Agent`] as a user turn.
//! The [`History`] lives here and is passed down by `&mut`.

mod commands;

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::agent::Agent;
use crate::config::Config;
use crate::message::History;
use crate::output::{Renderer, StdoutRenderer};

use commands::CommandAction;

/// Line source for the session loop.
pub trait Console {
    /// Next line of input. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// [`Console`] over rustyline, with line history persisted to
/// `~/.cache/tether/chat_history.txt`.
///
/// - **Ctrl+C**: discards the current line
/// - **Ctrl+D**: ends the session
pub struct ReadlineConsole {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl ReadlineConsole {
    pub fn new() -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = Config::cache_dir()
            .ok()
            .map(|dir| dir.join(crate::constants::HISTORY_FILENAME));
        if let Some(path) = history_path.as_ref().filter(|p| p.exists()) {
            let _ = editor.load_history(path);
        }
        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Writes the line history back to disk.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Err(e) = self.editor.save_history(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not save line history");
        }
        Ok(())
    }
}

impl Console for ReadlineConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e).context("failed to read input"),
        }
    }
}

/// Runs the AwaitingUser loop until `exit`, end of input, or a console error.
///
/// Model failures are rendered as errors and the loop carries on with the
/// history as it stood when the failure happened.
pub async fn run_session(
    console: &mut dyn Console,
    agent: &Agent,
    history: &mut History,
    renderer: &mut dyn Renderer,
) -> Result<()> {
    let prompt = format!("{} ", "You:".green().bold());

    loop {
        let Some(line) = console.read_line(&prompt)? else {
            renderer.notice("Goodbye!");
            return Ok(());
        };

        if let Some(directive) = commands::parse_directive(&line) {
            match commands::handle_directive(directive, history, renderer) {
                CommandAction::Continue => continue,
                CommandAction::Exit => return Ok(()),
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        history.push_user_text(line);
        match agent.respond(history, renderer).await {
            Ok(summary) => {
                tracing::debug!(
                    model_calls = summary.model_calls,
                    tool_calls = summary.tool_calls,
                    "turn complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "model call failed");
                renderer.error(&e.to_string());
            }
        }
    }
}

/// Starts an interactive session against `agent`.
pub async fn run_chat(agent: Agent) -> Result<()> {
    println!(
        "{} [session: {}] [model: {}] (type \"exit\" to quit)",
        "tether".bold().cyan(),
        agent.session_id()[..8].yellow(),
        agent.model_name().yellow(),
    );
    println!();

    let mut console = ReadlineConsole::new()?;
    let mut renderer = StdoutRenderer::new();
    let mut history = History::new();

    let result = run_session(&mut console, &agent, &mut history, &mut renderer).await;
    console.save()?;

    let (input, output) = renderer.totals();
    println!("{}", format!("[{input} in / {output} out tokens this session]").dimmed());
    result
}
