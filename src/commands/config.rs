use std::path::Path;

use tracing::{info, warn};

use crate::config::{config_path, load_settings, save_settings, Settings};
use crate::error::EquipScopeError;

pub fn get_preference(key: &str) -> Result<Option<String>, String> {
    info!("Getting preference: {}", key);
    get_preference_in(&config_path(), key)
}

pub fn set_preference(key: &str, value: &str) -> Result<(), String> {
    info!("Setting preference: {} = {}", key, value);
    set_preference_in(&config_path(), key, value)
}

fn get_preference_in(path: &Path, key: &str) -> Result<Option<String>, String> {
    let settings = open_settings(path)?;
    settings
        .get(key)
        .map_err(|e| EquipScopeError::Config(e.to_string()).into())
}

fn set_preference_in(path: &Path, key: &str, value: &str) -> Result<(), String> {
    let mut settings = open_settings(path)?;
    settings
        .set(key, value)
        .map_err(|e| EquipScopeError::Config(e.to_string()))?;
    save_settings(&settings, path).map_err(|e| {
        warn!("Failed to save settings to {:?}: {}", path, e);
        EquipScopeError::Config(e.to_string()).into()
    })
}

fn open_settings(path: &Path) -> Result<Settings, String> {
    load_settings(path).map_err(|e| {
        warn!("Failed to load settings from {:?}: {}", path, e);
        EquipScopeError::Config(e.to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        set_preference_in(&path, "ai_provider", "claude").unwrap();
        assert!(path.exists());
        assert_eq!(
            get_preference_in(&path, "ai_provider").unwrap(),
            Some("claude".to_string())
        );
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let err = get_preference_in(&path, "color_scheme").unwrap_err();
        assert!(err.starts_with("Config error"));
        assert!(err.contains("color_scheme"));

        let err = set_preference_in(&path, "color_scheme", "dark").unwrap_err();
        assert!(err.starts_with("Config error"));
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_settings_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "ai_provider = [not toml").unwrap();

        let err = get_preference_in(&path, "ai_provider").unwrap_err();
        assert!(err.starts_with("Config error"));
    }
}
