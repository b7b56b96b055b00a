pub mod computer;
pub mod weather;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::message::{History, ImageSource, ToolCall, ToolResult};
use crate::remote::{ExecError, RemoteExecutor};

use computer::ComputerTool;
use weather::{WeatherApi, WeatherTool};

/// What a tool produced on success.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// The action has no data to report.
    Empty,
    Text(String),
    Image(ImageSource),
}

impl ToolOutput {
    fn into_result(self, tool_use_id: &str) -> ToolResult {
        match self {
            ToolOutput::Empty => ToolResult::empty(tool_use_id),
            ToolOutput::Text(text) => ToolResult::text(tool_use_id, text),
            ToolOutput::Image(source) => ToolResult::image(tool_use_id, source),
        }
    }
}

/// Why a tool call failed. Always converted into an error-flagged result.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model's input did not match the tool's schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Remote(#[from] ExecError),
    #[error("unexpected output: {0}")]
    UnexpectedOutput(String),
    /// An upstream service failed.
    #[error("{0}")]
    Upstream(String),
}

impl ToolError {
    pub fn invalid(err: impl std::fmt::Display) -> Self {
        ToolError::InvalidInput(err.to_string())
    }
}

/// Declaration sent to the model so it knows what tools are available.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ToolDescriptor {
    /// A custom tool described by a JSON schema.
    Function {
        name: String,
        description: String,
        input_schema: Value,
    },
    /// The built-in computer-use tool type.
    Computer {
        #[serde(rename = "type")]
        kind: String,
        name: String,
        display_width_px: u32,
        display_height_px: u32,
        display_number: u32,
    },
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        match self {
            ToolDescriptor::Function { name, .. } | ToolDescriptor::Computer { name, .. } => name,
        }
    }
}

/// Every tool implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Declaration sent with every model call.
    fn descriptor(&self) -> ToolDescriptor;

    /// Prefix for the error text the model sees when a call fails.
    fn error_context(&self) -> String {
        format!("Error with {} tool", self.name())
    }

    /// Validate `input` into the tool's typed record and run it.
    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;
}

/// Runs `tool` for `call` and appends exactly one result to `history`,
/// whichever way the call ends.
pub async fn handle(tool: &dyn Tool, call: &ToolCall, history: &mut History) {
    let result = match tool.execute(call.input.clone()).await {
        Ok(output) => output.into_result(&call.id),
        Err(err) => {
            tracing::warn!(tool = %call.name, id = %call.id, error = %err, "tool call failed");
            ToolResult::error(&call.id, format!("{}: {}", tool.error_context(), err))
        }
    };
    history.push_tool_result(result);
}

/// Holds all registered tools and dispatches calls by name.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Called during startup.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(Arc::from(tool));
    }

    /// Produce descriptors for the model (sent in every request).
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Records `call` on the latest assistant turn and answers it.
    ///
    /// Never fails: tool errors, invalid input, and unknown tool names all
    /// become an error-flagged result, so every call gets exactly one answer.
    pub async fn dispatch(&self, call: ToolCall, history: &mut History) {
        history.attach_tool_call(call.clone());

        match self.get(&call.name) {
            Some(tool) => {
                tracing::debug!(tool = %call.name, id = %call.id, input = %call.input, "dispatching");
                handle(tool.as_ref(), &call, history).await;
            }
            None => {
                tracing::warn!(tool = %call.name, id = %call.id, "unknown tool requested");
                history.push_tool_result(ToolResult::error(
                    &call.id,
                    format!("Unknown tool: {}", call.name),
                ));
            }
        }
    }
}

impl ToolRegistry {
    /// Create a registry with the desktop and weather tools.
    pub fn with_builtins(config: &Config, executor: Arc<dyn RemoteExecutor>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ComputerTool::new(executor, config.remote.clone())));
        registry.register(Box::new(WeatherTool::new(Arc::new(WeatherApi::new(
            config.weather_api_key(),
            config.weather_base_url(),
        )))));
        registry
    }
}
