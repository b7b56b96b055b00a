//! Output rendering abstraction for tether.
//!
//! Defines the [`Renderer`] trait that decouples the agent loop from the
//! display layer. [`StdoutRenderer`] prints the transcript to the terminal;
//! diagnostics go through `tracing` to stderr instead.

use colored::Colorize;

use crate::format;
use crate::message::{ToolCall, ToolResult};
use crate::provider::Usage;

/// Receives transcript events from the agent loop and chat session.
pub trait Renderer {
    /// A new assistant turn (the primary text or the placeholder).
    fn assistant_text(&mut self, text: &str);

    /// A tool call is about to run.
    fn tool_start(&mut self, call: &ToolCall);

    /// The result appended for the last tool call.
    fn tool_result(&mut self, result: &ToolResult);

    /// Token usage for one model call.
    fn usage(&mut self, usage: &Usage);

    /// Informational line (directive acknowledgements, loop limits).
    fn notice(&mut self, text: &str);

    /// One line of the `log` directive's history dump.
    fn history_line(&mut self, line: &str);

    /// A labeled error that does not end the session.
    fn error(&mut self, err: &str);
}

/// Renders the transcript to stdout with colors.
///
/// Keeps running token totals so the session can report them on exit.
pub struct StdoutRenderer {
    input_tokens: u64,
    output_tokens: u64,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    /// Total (input, output) tokens reported so far.
    pub fn totals(&self) -> (u64, u64) {
        (self.input_tokens, self.output_tokens)
    }
}

impl Renderer for StdoutRenderer {
    fn assistant_text(&mut self, text: &str) {
        println!();
        println!("{} {}", "assistant:".cyan().bold(), text);
    }

    fn tool_start(&mut self, call: &ToolCall) {
        println!("{}", format::tool_call_summary(call).yellow());
    }

    fn tool_result(&mut self, result: &ToolResult) {
        let summary = format::tool_result_summary(result);
        if result.is_error {
            println!("  {} {}", "error:".red().bold(), summary);
        } else {
            println!("  {}", summary.dimmed());
        }
    }

    fn usage(&mut self, usage: &Usage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        println!(
            "{}",
            format!("[{} in / {} out tokens]", usage.input_tokens, usage.output_tokens).dimmed()
        );
    }

    fn notice(&mut self, text: &str) {
        println!("{}", text.dimmed());
    }

    fn history_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, err: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), err);
    }
}

/// Collects rendered events as plain strings for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub assistant: Vec<String>,
    pub tools: Vec<String>,
    pub results: Vec<ToolResult>,
    pub notices: Vec<String>,
    pub history: Vec<String>,
    pub errors: Vec<String>,
    pub usage: Vec<Usage>,
}

#[cfg(test)]
impl Renderer for RecordingRenderer {
    fn assistant_text(&mut self, text: &str) {
        self.assistant.push(text.to_string());
    }

    fn tool_start(&mut self, call: &ToolCall) {
        self.tools.push(call.name.clone());
    }

    fn tool_result(&mut self, result: &ToolResult) {
        self.results.push(result.clone());
    }

    fn usage(&mut self, usage: &Usage) {
        self.usage.push(*usage);
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn history_line(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn error(&mut self, err: &str) {
        self.errors.push(err.to_string());
    }
}
