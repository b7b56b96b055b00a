//! Conversation history types for tether.
//!
//! A [`History`] is an ordered list of [`Turn`]s. Each turn's [`Content`] is
//! either a single text value or a sequence of [`ContentBlock`]s; a turn is
//! upgraded to block form the first time a tool call is attached to it and
//! never goes back. The serde shape matches the Anthropic Messages API, so a
//! history serializes directly into a request body.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Identifier chosen by the model; the matching result echoes it.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool-specific JSON input.
    pub input: Value,
}

/// The answer to exactly one [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ToolResultContent>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// Payload of a tool result: plain text or a list of result blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ResultBlock>),
}

/// One block inside a tool result payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultBlock {
    Text { text: String },
    Image { source: ImageSource },
}

/// Inline image data. Held as raw bytes; base64 only on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 {
        media_type: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

impl ImageSource {
    /// Wraps raw PNG bytes.
    pub fn png(data: Vec<u8>) -> Self {
        ImageSource::Base64 {
            media_type: "image/png".to_string(),
            data,
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            ImageSource::Base64 { media_type, .. } => media_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            ImageSource::Base64 { data, .. } => data,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

impl ToolResult {
    /// A successful result with no payload.
    pub fn empty(tool_use_id: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: None,
            is_error: false,
        }
    }

    /// A successful text result.
    pub fn text(tool_use_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: Some(ToolResultContent::Text(text.into())),
            is_error: false,
        }
    }

    /// A successful result carrying a single image block.
    pub fn image(tool_use_id: impl Into<String>, source: ImageSource) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: Some(ToolResultContent::Blocks(vec![ResultBlock::Image {
                source,
            }])),
            is_error: false,
        }
    }

    /// An error-flagged result with a diagnostic message.
    pub fn error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: Some(ToolResultContent::Text(message.into())),
            is_error: true,
        }
    }

    /// Returns the text payload, if the result carries one.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Some(ToolResultContent::Text(text)) => Some(text),
            Some(ToolResultContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ResultBlock::Text { text } => Some(text.as_str()),
                ResultBlock::Image { .. } => None,
            }),
            None => None,
        }
    }

    /// Returns the first inline image, if any.
    pub fn image_source(&self) -> Option<&ImageSource> {
        match &self.content {
            Some(ToolResultContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ResultBlock::Image { source } => Some(source),
                ResultBlock::Text { .. } => None,
            }),
            _ => None,
        }
    }
}

/// One structural unit within a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCall),
    ToolResult(ToolResult),
}

/// Turn content: a single text value, or blocks once upgraded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One role-tagged entry in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: Content,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(text.into()),
        }
    }

    /// A user turn holding a single tool result block.
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::User,
            content: Content::Blocks(vec![ContentBlock::ToolResult(result)]),
        }
    }

    /// The first text in this turn, if any.
    pub fn primary_text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }

    /// Returns the turn's blocks, upgrading text content to block form first.
    ///
    /// The upgrade keeps non-empty text as a leading [`ContentBlock::Text`].
    /// There is no inverse operation.
    pub fn blocks_mut(&mut self) -> &mut Vec<ContentBlock> {
        if let Content::Text(text) = &mut self.content {
            let text = std::mem::take(text);
            let blocks = if text.is_empty() {
                Vec::new()
            } else {
                vec![ContentBlock::Text { text }]
            };
            self.content = Content::Blocks(blocks);
        }
        let Content::Blocks(blocks) = &mut self.content else {
            unreachable!("turn content was upgraded above");
        };
        blocks
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            Content::Text(_) => &[],
            Content::Blocks(blocks) => blocks,
        }
    }

    #[cfg(test)]
    pub fn is_blocks(&self) -> bool {
        matches!(self.content, Content::Blocks(_))
    }
}

/// Ordered, append-only log of turns for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    pub fn push_assistant_text(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    /// Appends a tool call to the most recent assistant turn.
    ///
    /// If the history has no assistant turn yet, one is created to carry the
    /// call.
    pub fn attach_tool_call(&mut self, call: ToolCall) {
        let idx = match self.turns.iter().rposition(|t| t.role == Role::Assistant) {
            Some(idx) => idx,
            None => {
                self.turns.push(Turn {
                    role: Role::Assistant,
                    content: Content::Blocks(Vec::new()),
                });
                self.turns.len() - 1
            }
        };
        self.turns[idx].blocks_mut().push(ContentBlock::ToolUse(call));
    }

    /// Appends a tool result as a new user turn.
    pub fn push_tool_result(&mut self, result: ToolResult) {
        self.turns.push(Turn::tool_result(result));
    }

    /// The tool result carried by the last turn, if it is a result turn.
    pub fn last_tool_result(&self) -> Option<&ToolResult> {
        self.turns.last().and_then(|t| {
            t.blocks().iter().find_map(|b| match b {
                ContentBlock::ToolResult(r) => Some(r),
                _ => None,
            })
        })
    }

    /// Ids of tool calls that have no result yet, in call order.
    pub fn unanswered_tool_calls(&self) -> Vec<&str> {
        let answered: HashSet<&str> = self
            .blocks()
            .filter_map(|b| match b {
                ContentBlock::ToolResult(r) => Some(r.tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        self.blocks()
            .filter_map(|b| match b {
                ContentBlock::ToolUse(call) if !answered.contains(call.id.as_str()) => {
                    Some(call.id.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Drops every turn. Only the `reset` directive calls this.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.turns.iter().flat_map(|t| t.blocks().iter())
    }
}
