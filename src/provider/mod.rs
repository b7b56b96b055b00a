//! LLM provider abstraction for tether.
//!
//! The agent loop talks to the model only through [`ModelClient`], so tests
//! can script responses. [`AnthropicClient`] is the production implementation.

mod client;
mod types;

pub use client::AnthropicClient;
pub use types::{ModelError, ModelRequest, ModelResponse, Usage};
#[cfg(test)]
pub use types::ResponseBlock;

/// An opaque request/response model call.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError>;
}
