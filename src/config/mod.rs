//! Configuration types and path resolution for tether.
//!
//! Tether stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/tether/config.toml` on Linux). A `tether.toml` in the
//! current directory or any parent up to the git root overrides it.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::{Config, RemoteConfig};

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project(&std::env::current_dir()?)?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        config.apply_env_fallbacks();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.model, crate::constants::DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.remote, RemoteConfig::default());
        assert_eq!(config.remote.display_width, 1600);
        assert_eq!(config.agent.max_tool_rounds, None);
    }

    #[test]
    fn test_partial_remote_section_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
[remote]
host = "desk"
display_number = 1
"#,
        )
        .unwrap();
        assert_eq!(config.remote.host.as_deref(), Some("desk"));
        assert_eq!(config.remote.display_number, 1);
        assert_eq!(config.remote.display_height, 1200);
        assert_eq!(config.remote.type_delay_ms, 100);
    }

    #[test]
    fn test_env_substitution_and_empty_to_none() {
        std::env::set_var("TETHER_TEST_SUBST_HOST", "vm-7");
        let mut config = Config::from_toml_str(
            r#"
[remote]
host = "user@{env:TETHER_TEST_SUBST_HOST}"

[weather]
api_key = "{env:TETHER_TEST_SUBST_UNSET_VAR}"
"#,
        )
        .unwrap();
        config.resolve_substitutions();
        assert_eq!(config.remote.host.as_deref(), Some("user@vm-7"));
        assert_eq!(config.weather.api_key, None);
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let global = Config::from_toml_str(
            r#"
model = "global-model"
[provider.anthropic]
api_key = "global-key"
[remote]
host = "global-host"
[agent]
max_tool_rounds = 5
"#,
        )
        .unwrap();
        let project = Config::from_toml_str(
            r#"
model = "project-model"
[remote]
display_number = 2
"#,
        )
        .unwrap();

        let merged = Config::merge(global, project);
        assert_eq!(merged.model, "project-model");
        assert_eq!(
            merged.provider.anthropic.and_then(|e| e.api_key).as_deref(),
            Some("global-key")
        );
        assert_eq!(merged.remote.display_number, 2);
        assert_eq!(merged.remote.host.as_deref(), Some("global-host"));
        assert_eq!(merged.agent.max_tool_rounds, Some(5));
    }

    #[test]
    fn test_project_remote_keeps_global_geometry() {
        let global = Config::from_toml_str(
            r#"
[remote]
display_width = 1024
display_height = 768
type_delay_ms = 20
screenshot_path = "/var/tmp/shot.png"
"#,
        )
        .unwrap();
        let project = Config::from_toml_str(
            r#"
[remote]
host = "desk"
"#,
        )
        .unwrap();

        let remote = Config::merge(global, project).remote;
        assert_eq!(remote.host.as_deref(), Some("desk"));
        assert_eq!(remote.display_width, 1024);
        assert_eq!(remote.display_height, 768);
        assert_eq!(remote.type_delay_ms, 20);
        assert_eq!(remote.screenshot_path, "/var/tmp/shot.png");
        assert_eq!(remote.display_number, RemoteConfig::default().display_number);
    }

    #[test]
    fn test_zero_tool_rounds_is_rejected() {
        let config = Config::from_toml_str("[agent]\nmax_tool_rounds = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = Config::from_toml_str("[agent]\nmax_tool_rounds = 1\n").unwrap();
        assert!(config.validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_project_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::PROJECT_CONFIG_FILENAME),
            "model = \"from-project\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Config::load_project(&nested).unwrap().unwrap();
        assert_eq!(found.model, "from-project");
    }

    #[test]
    fn test_load_project_stops_at_git_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::PROJECT_CONFIG_FILENAME),
            "model = \"outside\"\n",
        )
        .unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(Config::load_project(&repo).unwrap().is_none());
    }

    #[test]
    fn test_system_prompt_expands_datetime() {
        let config = Config::from_toml_str("system_prompt = \"now: {datetime}\"").unwrap();
        let when = chrono::Local.with_ymd_and_hms(2024, 11, 5, 14, 3, 9).unwrap();
        assert_eq!(
            config.system_prompt_at(when),
            "now: Tuesday, November 5, 2024 2:03:09 PM"
        );
    }

    #[test]
    fn test_default_system_prompt_mentions_time() {
        let config = Config::default();
        let when = chrono::Local.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let prompt = config.system_prompt_at(when);
        assert!(prompt.contains("January 2, 2024"));
        assert!(!prompt.contains("{datetime}"));
    }

    #[test]
    fn test_masked_hides_keys() {
        let config = Config::from_toml_str(
            r#"
[provider.anthropic]
api_key = "sk-ant-secret"
[weather]
api_key = "abcdef"
"#,
        )
        .unwrap();
        let masked = config.masked();
        assert_eq!(
            masked.provider.anthropic.unwrap().api_key.as_deref(),
            Some("sk-a****")
        );
        assert_eq!(masked.weather.api_key.as_deref(), Some("abcd****"));
    }
}
