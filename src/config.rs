use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::aspect::AspectMode;
use crate::error::PlayerError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub interface: InterfaceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    pub online: OnlineConfig,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
    pub seek_step_ms: u64,
    pub volume_percent: u8,
    pub default_aspect: AspectMode,
    pub save_on_exit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub hide_controls_after_ms: u64,
    pub splash_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineConfig {
    pub home_url: String,
}

/// Entry of the Links menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub label: String,
    pub url: String,
}

impl AppConfig {
    /// Load the user config file, if any, merged over the built-in defaults.
    pub fn load() -> Result<Self, PlayerError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, PlayerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let user = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&user)
    }

    /// Parse `user` as overrides on top of the defaults. Keys missing from
    /// `user` keep their default values.
    pub fn from_toml(user: &str) -> Result<Self, PlayerError> {
        let mut merged: toml::Table = DEFAULT_CONFIG
            .parse()
            .map_err(|e: toml::de::Error| PlayerError::Config(e.to_string()))?;
        let user: toml::Table = user
            .parse()
            .map_err(|e: toml::de::Error| PlayerError::Config(e.to_string()))?;
        merge(&mut merged, user);

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| PlayerError::Config(e.to_string()))
    }

    /// Path to the user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Where playback history is kept.
    pub fn history_path(&self) -> PathBuf {
        if let Some(file) = &self.history.file {
            return file.clone();
        }
        Self::project_dirs()
            .map(|d| d.data_dir().join("history.json"))
            .unwrap_or_else(|| PathBuf::from("history.json"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "isla-player")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overrides` onto `base`. Tables merge key by key; any
/// other value replaces the base value.
fn merge(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(table)) => {
                merge(base_table, table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.playback.poll_interval_ms, 1000);
        assert_eq!(config.playback.seek_step_ms, 10_000);
        assert_eq!(config.playback.default_aspect, AspectMode::Fit);
        assert!(config.playback.save_on_exit);
        assert_eq!(config.interface.hide_controls_after_ms, 3000);
        assert_eq!(config.interface.splash_ms, 2800);
        assert!(config.history.file.is_none());
        assert!(config.links.is_empty());
    }

    #[test]
    fn test_partial_user_file_merges_over_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [playback]
            default_aspect = "4:3"
            volume_percent = 40

            [history]
            file = "/tmp/h.json"

            [[links]]
            label = "Site"
            url = "https://example.org"
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.default_aspect, AspectMode::ratio(4, 3).unwrap());
        assert_eq!(config.playback.volume_percent, 40);
        assert_eq!(config.playback.seek_step_ms, 10_000);
        assert_eq!(config.history_path(), PathBuf::from("/tmp/h.json"));
        assert_eq!(config.links.len(), 1);
        assert_eq!(config.links[0].label, "Site");
    }

    #[test]
    fn test_invalid_aspect_is_config_error() {
        let result = AppConfig::from_toml("[playback]\ndefault_aspect = \"0:0\"\n");
        assert!(matches!(result, Err(PlayerError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.online.home_url, AppConfig::default().online.home_url);
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = AppConfig::from_toml(&serialized).unwrap();
        assert_eq!(
            deserialized.playback.poll_interval_ms,
            config.playback.poll_interval_ms
        );
        assert_eq!(
            deserialized.playback.default_aspect,
            config.playback.default_aspect
        );
    }
}
