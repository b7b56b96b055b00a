//! Request and response shapes for a model call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{ToolCall, Turn};
use crate::tools::ToolDescriptor;

/// Everything sent with one model invocation.
#[derive(Debug, Serialize)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: &'a [Turn],
    pub tools: &'a [ToolDescriptor],
}

/// One block of a model response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse(ToolCall),
    /// Block types tether does not act on.
    #[serde(other)]
    Other,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A complete model response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl ModelResponse {
    /// The first text block, if any.
    pub fn primary_text(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ResponseBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool calls in response order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.content.iter().filter_map(|b| match b {
            ResponseBlock::ToolUse(call) => Some(call),
            _ => None,
        })
    }
}

/// Failure of a model call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
