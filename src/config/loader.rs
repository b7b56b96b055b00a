//! File loading and merging for tether configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{default_model, AgentConfig, Config, ProviderEntry, RemoteConfig, WeatherConfig};

/// Written to `config.toml` on first run.
const DEFAULT_CONFIG_TOML: &str = r#"# model = "claude-3-5-sonnet-20241022"
# max_tokens = 1024

[provider.anthropic]
api_key = "{env:ANTHROPIC_API_KEY}"

[remote]
host = "{env:COMPUTER_USE_SSH_HOST}"
display_number = 0
display_width = 1600
display_height = 1200

[weather]
api_key = "{env:WEATHERAPI_API_KEY}"

[agent]
# max_tool_rounds = 25
"#;

impl Config {
    /// Parses a TOML document into a config, applying serde defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    /// Loads the global config from `~/.config/tether/config.toml`.
    ///
    /// If no config file exists, creates one with `{env:VAR}` placeholders
    /// and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG_TOML)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            return Self::from_toml_str(DEFAULT_CONFIG_TOML);
        }
        Self::load_file(&path)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Look for tether.toml in `start`, then walk up to the git root.
    pub(super) fn load_project(start: &Path) -> Result<Option<Config>> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Rejects values that parse but cannot be honored.
    pub(super) fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.agent.max_tool_rounds != Some(0),
            "agent.max_tool_rounds must be at least 1 (omit it for no limit)"
        );
        Ok(())
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            max_tokens: if project.max_tokens != crate::constants::MAX_TOKENS {
                project.max_tokens
            } else {
                global.max_tokens
            },
            system_prompt: project.system_prompt.or(global.system_prompt),
            provider: super::types::ProviderConfig {
                anthropic: merge_entry(project.provider.anthropic, global.provider.anthropic),
            },
            remote: merge_remote(project.remote, global.remote),
            weather: WeatherConfig {
                api_key: project.weather.api_key.or(global.weather.api_key),
                base_url: project.weather.base_url.or(global.weather.base_url),
            },
            agent: AgentConfig {
                max_tool_rounds: project.agent.max_tool_rounds.or(global.agent.max_tool_rounds),
            },
        }
    }
}

/// Project `[remote]` keys win one by one. A field the project file leaves
/// out deserializes to its default, so it falls back to the global value.
fn merge_remote(project: RemoteConfig, global: RemoteConfig) -> RemoteConfig {
    let default = RemoteConfig::default();
    RemoteConfig {
        host: project.host.or(global.host),
        display_number: prefer(project.display_number, global.display_number, default.display_number),
        display_width: prefer(project.display_width, global.display_width, default.display_width),
        display_height: prefer(project.display_height, global.display_height, default.display_height),
        type_delay_ms: prefer(project.type_delay_ms, global.type_delay_ms, default.type_delay_ms),
        max_output_bytes: prefer(
            project.max_output_bytes,
            global.max_output_bytes,
            default.max_output_bytes,
        ),
        screenshot_path: prefer(project.screenshot_path, global.screenshot_path, default.screenshot_path),
    }
}

fn prefer<T: PartialEq>(project: T, global: T, default: T) -> T {
    if project != default {
        project
    } else {
        global
    }
}

fn merge_entry(project: Option<ProviderEntry>, global: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (project, global) {
        (Some(p), Some(g)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
        }),
        (p, g) => p.or(g),
    }
}
