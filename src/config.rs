//! User settings, data locations and API credential lookup.
//!
//! Settings live in a TOML file (`<config_dir>/equipscope/config.toml` unless
//! `EQUIPSCOPE_CONFIG` points elsewhere). Credentials come from the
//! provider's environment variable first, then the OS keychain.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Keychain account all credentials are stored under.
pub const KEYCHAIN_USER: &str = "equipscope";

const APP_DIR: &str = "equipscope";
const CONFIG_FILE: &str = "config.toml";
const HISTORY_DB_FILE: &str = "history.db";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// External reasoning services insights can be requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    Claude,
    OpenAi,
    OpenRouter,
}

impl AiProvider {
    pub const ALL: [AiProvider; 4] = [
        AiProvider::Gemini,
        AiProvider::Claude,
        AiProvider::OpenAi,
        AiProvider::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::Claude => "claude",
            AiProvider::OpenAi => "openai",
            AiProvider::OpenRouter => "openrouter",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-1.5-flash",
            AiProvider::Claude => "claude-sonnet-4-20250514",
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::OpenRouter => "anthropic/claude-sonnet-4",
        }
    }

    /// Keychain service name holding this provider's API key.
    pub fn keychain_service(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "equipscope-gemini-api",
            AiProvider::Claude => "equipscope-claude-api",
            AiProvider::OpenAi => "equipscope-openai-api",
            AiProvider::OpenRouter => "equipscope-openrouter-api",
        }
    }

    /// Environment variable checked before the keychain.
    pub fn env_var(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "GEMINI_API_KEY",
            AiProvider::Claude => "ANTHROPIC_API_KEY",
            AiProvider::OpenAi => "OPENAI_API_KEY",
            AiProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(AiProvider::Gemini),
            "claude" => Ok(AiProvider::Claude),
            "openai" => Ok(AiProvider::OpenAi),
            "openrouter" => Ok(AiProvider::OpenRouter),
            other => Err(format!(
                "Unknown AI provider: '{}'. Supported: gemini, claude, openai, openrouter",
                other
            )),
        }
    }
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai_provider: String,
    /// Overrides the provider's default model
    pub ai_model: Option<String>,
    pub request_timeout_secs: u64,
    /// Overrides `<data_dir>/equipscope/history.db`
    pub history_db: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::Gemini.as_str().to_string(),
            ai_model: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            history_db: None,
        }
    }
}

impl Settings {
    /// The configured provider, falling back to Gemini on an unknown name.
    pub fn provider(&self) -> AiProvider {
        self.ai_provider.parse().unwrap_or_else(|e| {
            warn!("{}; falling back to gemini", e);
            AiProvider::Gemini
        })
    }

    pub fn model(&self) -> String {
        self.ai_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.history_db
            .clone()
            .unwrap_or_else(|| data_dir().join(HISTORY_DB_FILE))
    }

    /// Read a single preference by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "ai_provider" => Some(self.ai_provider.clone()),
            "ai_model" => self.ai_model.clone(),
            "request_timeout_secs" => Some(self.request_timeout_secs.to_string()),
            "history_db" => self
                .history_db
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            other => bail!("Unknown preference key: '{}'", other),
        };
        Ok(value)
    }

    /// Update a single preference by key. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "ai_provider" => {
                let provider: AiProvider = value.parse().map_err(anyhow::Error::msg)?;
                self.ai_provider = provider.as_str().to_string();
            }
            "ai_model" => {
                self.ai_model = (!value.is_empty()).then(|| value.to_string());
            }
            "request_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid timeout '{}': {}", value, e))?;
                if secs == 0 {
                    bail!("Timeout must be at least one second");
                }
                self.request_timeout_secs = secs;
            }
            "history_db" => {
                self.history_db = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            other => bail!("Unknown preference key: '{}'", other),
        }
        Ok(())
    }
}

/// Location of the settings file.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("EQUIPSCOPE_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Directory holding the history database.
pub fn data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("EQUIPSCOPE_DATA_DIR") {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Load settings from the default location, logging and falling back to
/// defaults if the file is unreadable.
pub fn load_settings_or_default() -> Settings {
    let path = config_path();
    load_settings(&path).unwrap_or_else(|e| {
        warn!("Failed to load settings from {:?}, using defaults: {}", path, e);
        Settings::default()
    })
}

/// Write settings atomically: temp file in the same directory, then rename.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(settings)?;

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Settings path has no parent directory: {:?}", path))?;
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.persist(path)?;

    info!("Wrote settings to {:?}", path);
    Ok(())
}

/// Find an API key for `provider`, or `None` if none is configured.
///
/// Keychain failures other than a missing entry are logged and treated as
/// no credential.
pub fn resolve_api_key(provider: AiProvider) -> Option<String> {
    if let Ok(key) = std::env::var(provider.env_var()) {
        if !key.trim().is_empty() {
            debug!("Using API key for {} from {}", provider, provider.env_var());
            return Some(key.trim().to_string());
        }
    }

    let entry = match Entry::new(provider.keychain_service(), KEYCHAIN_USER) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Failed to create keyring entry for {}: {}", provider, e);
            return None;
        }
    };
    match entry.get_password() {
        Ok(key) if !key.trim().is_empty() => Some(key),
        Ok(_) | Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!("Failed to read API key for {} from keychain: {}", provider, e);
            None
        }
    }
}
