//! Environment variable substitution, API key resolution, and derived values.

use chrono::{DateTime, Local};

use super::types::{Config, ProviderEntry};

use crate::constants::{
    ANTHROPIC_API_BASE, DEFAULT_SYSTEM_PROMPT, SSH_HOST_ENV, WEATHER_API_BASE,
    WEATHER_API_KEY_ENV,
};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    ///
    /// Optional fields that resolve to an empty string become `None`, so an
    /// unset variable behaves like an absent key.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        Self::resolve_opt(&mut self.system_prompt);
        if let Some(ref mut entry) = self.provider.anthropic {
            Self::resolve_provider_entry(entry);
        }
        Self::resolve_opt(&mut self.remote.host);
        self.remote.screenshot_path = Self::resolve_str(&self.remote.screenshot_path);
        Self::resolve_opt(&mut self.weather.api_key);
        Self::resolve_opt(&mut self.weather.base_url);
    }

    /// Fills the remote host from `COMPUTER_USE_SSH_HOST` when the config
    /// leaves it unset.
    pub(super) fn apply_env_fallbacks(&mut self) {
        if self.remote.host.is_none() {
            self.remote.host = non_empty_env(SSH_HOST_ENV);
        }
    }

    fn resolve_provider_entry(entry: &mut ProviderEntry) {
        Self::resolve_opt(&mut entry.api_key);
        Self::resolve_opt(&mut entry.base_url);
    }

    fn resolve_opt(value: &mut Option<String>) {
        if let Some(s) = value.take() {
            let resolved = Self::resolve_str(&s);
            if !resolved.is_empty() {
                *value = Some(resolved);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// Resolve the Anthropic API key: env var first, then config value.
    pub fn resolve_api_key(&self) -> Option<String> {
        non_empty_env("ANTHROPIC_API_KEY").or_else(|| {
            self.provider
                .anthropic
                .as_ref()
                .and_then(|e| e.api_key.clone())
        })
    }

    /// Base URL for the Anthropic API.
    pub fn anthropic_base_url(&self) -> String {
        self.provider
            .anthropic
            .as_ref()
            .and_then(|e| e.base_url.clone())
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string())
    }

    /// Resolve the WeatherAPI key: env var first, then config value.
    pub fn weather_api_key(&self) -> Option<String> {
        non_empty_env(WEATHER_API_KEY_ENV).or_else(|| self.weather.api_key.clone())
    }

    /// Base URL for WeatherAPI.
    pub fn weather_base_url(&self) -> String {
        self.weather
            .base_url
            .clone()
            .unwrap_or_else(|| WEATHER_API_BASE.to_string())
    }

    /// The system preamble with `{datetime}` expanded to `now`.
    pub fn system_prompt_at(&self, now: DateTime<Local>) -> String {
        let template = self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
        template.replace("{datetime}", &now.format("%A, %B %-d, %Y %-I:%M:%S %p").to_string())
    }

    /// A copy with secrets replaced, for display.
    pub fn masked(&self) -> Config {
        let mut copy = self.clone();
        if let Some(ref mut entry) = copy.provider.anthropic {
            entry.api_key = entry.api_key.as_deref().map(mask);
        }
        copy.weather.api_key = copy.weather.api_key.as_deref().map(mask);
        copy
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}
