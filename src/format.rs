//! Plain-text summaries of turns, tool calls, and tool results.
//!
//! Colors are applied by the renderer, not here.

use crate::constants::LOG_PREVIEW_MAX_CHARS;
use crate::message::{History, ToolCall, ToolResult, Turn};

/// One line per turn: `role=<role> <preview>`.
pub fn history_lines(history: &History) -> Vec<String> {
    history
        .turns()
        .iter()
        .map(|turn| format!("role={} {}", turn.role, turn_preview(turn)))
        .collect()
}

/// The turn's first text, or the JSON of its first block cut to
/// [`LOG_PREVIEW_MAX_CHARS`].
pub fn turn_preview(turn: &Turn) -> String {
    if let Some(text) = turn.primary_text() {
        return text.to_string();
    }
    match turn.blocks().first() {
        Some(block) => {
            let json = serde_json::to_string(block).unwrap_or_default();
            truncate(&json, LOG_PREVIEW_MAX_CHARS)
        }
        None => String::new(),
    }
}

/// Cuts `text` to at most `max` chars, ending with `...` when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub fn tool_call_summary(call: &ToolCall) -> String {
    format!("tool use {} {}", call.name, call.input)
}

pub fn tool_result_summary(result: &ToolResult) -> String {
    if let Some(image) = result.image_source() {
        return format!("[{}, {} bytes]", image.media_type(), image.data().len());
    }
    match result.text_content() {
        Some(text) => truncate(text, LOG_PREVIEW_MAX_CHARS),
        None => "(no output)".to_string(),
    }
}
