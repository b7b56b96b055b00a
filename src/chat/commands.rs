//! Session directives typed at the prompt.
//!
//! Directives are bare words, matched case-insensitively after trimming, so
//! `Exit` and `  log ` both count. Anything else is a user message.

use crate::format;
use crate::message::History;
use crate::output::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive {
    /// End the session.
    Exit,
    /// Drop the whole history and keep going.
    Reset,
    /// Print one line per turn.
    Log,
}

/// Action for the session loop after a directive ran.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    Continue,
    Exit,
}

pub(crate) fn parse_directive(line: &str) -> Option<Directive> {
    match line.trim().to_lowercase().as_str() {
        "exit" => Some(Directive::Exit),
        "reset" => Some(Directive::Reset),
        "log" => Some(Directive::Log),
        _ => None,
    }
}

pub(crate) fn handle_directive(
    directive: Directive,
    history: &mut History,
    renderer: &mut dyn Renderer,
) -> CommandAction {
    match directive {
        Directive::Exit => {
            renderer.notice("Goodbye!");
            CommandAction::Exit
        }
        Directive::Reset => {
            renderer.notice("Resetting conversation history...");
            history.clear();
            CommandAction::Continue
        }
        Directive::Log => {
            renderer.notice("Logging conversation history...");
            for line in format::history_lines(history) {
                renderer.history_line(&line);
            }
            CommandAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingRenderer;

    #[test]
    fn test_parse_directive() {
        assert_eq!(parse_directive("exit"), Some(Directive::Exit));
        assert_eq!(parse_directive("  EXIT \n"), Some(Directive::Exit));
        assert_eq!(parse_directive("Reset"), Some(Directive::Reset));
        assert_eq!(parse_directive("log"), Some(Directive::Log));
        assert_eq!(parse_directive("exit now"), None);
        assert_eq!(parse_directive("/exit"), None);
        assert_eq!(parse_directive(""), None);
    }

    #[test]
    fn test_log_renders_each_turn() {
        let mut history = History::new();
        history.push_user_text("hi");
        history.push_assistant_text("hello");
        let mut renderer = RecordingRenderer::default();

        let action = handle_directive(Directive::Log, &mut history, &mut renderer);

        assert_eq!(action, CommandAction::Continue);
        assert_eq!(renderer.history, vec!["role=user hi", "role=assistant hello"]);
    }

    #[test]
    fn test_reset_then_log_renders_nothing() {
        let mut history = History::new();
        for i in 0..25 {
            history.push_user_text(format!("message {i}"));
        }
        let mut renderer = RecordingRenderer::default();

        handle_directive(Directive::Reset, &mut history, &mut renderer);
        handle_directive(Directive::Log, &mut history, &mut renderer);

        assert!(history.is_empty());
        assert!(renderer.history.is_empty());
    }
}
