//! Anthropic Messages API client.
//!
//! Sends the whole history with the computer-use beta enabled and decodes the
//! response into [`ModelResponse`]. One request per call; no streaming and no
//! retries.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::types::{ModelError, ModelRequest, ModelResponse};
use super::ModelClient;
use crate::config::Config;
use crate::constants::{ANTHROPIC_VERSION, COMPUTER_USE_BETA};

/// A configured Anthropic client.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client from the loaded config.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.resolve_api_key().context(
            "No API key found for Anthropic. Set ANTHROPIC_API_KEY or configure it in config.toml",
        )?;
        Ok(Self::new(api_key, config.anthropic_base_url()))
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

/// Pulls the human-readable message out of an API error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait::async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("anthropic-beta", COMPUTER_USE_BETA)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
