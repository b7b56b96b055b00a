//! Struct definitions and serde defaults for tether configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_NUMBER, DEFAULT_DISPLAY_WIDTH,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SCREENSHOT_PATH, DEFAULT_TYPE_DELAY_MS,
};

/// Root configuration for tether, deserialized from `config.toml`.
///
/// Fields use serde defaults so tether can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Model identifier (e.g. `"claude-3-5-sonnet-20241022"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Response size cap sent with every model call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Overrides the built-in system preamble. `{datetime}` is expanded.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// The desktop the computer tool drives.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Weather tool settings.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    crate::constants::MAX_TOKENS
}

/// Provider-specific configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// Configuration for the Anthropic API.
    pub anthropic: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies).
    pub base_url: Option<String>,
}

/// Remote desktop target.
///
/// The display number and geometry are both declared to the model and used
/// by the executor, so the two can never disagree.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// SSH host of the desktop. Commands run locally when unset.
    pub host: Option<String>,
    /// X display number (`DISPLAY=:<n>`).
    pub display_number: u32,
    /// Display width in pixels.
    pub display_width: u32,
    /// Display height in pixels.
    pub display_height: u32,
    /// Delay between keystrokes for the `type` action.
    pub type_delay_ms: u64,
    /// Cap on a single command's stdout.
    pub max_output_bytes: usize,
    /// Scratch file on the remote host for screenshots.
    pub screenshot_path: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            display_number: DEFAULT_DISPLAY_NUMBER,
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            type_delay_ms: DEFAULT_TYPE_DELAY_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            screenshot_path: DEFAULT_SCREENSHOT_PATH.to_string(),
        }
    }
}

/// WeatherAPI settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Agent loop settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AgentConfig {
    /// Stop after this many tool rounds in one user turn. Unbounded when unset.
    pub max_tool_rounds: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            provider: ProviderConfig::default(),
            remote: RemoteConfig::default(),
            weather: WeatherConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}
