use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CaisseError, Result};
use crate::reports::Frequency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// External category table replacing the built-in one.
    #[serde(default)]
    pub rules_path: Option<String>,
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

fn default_top_limit() -> usize {
    10
}

fn default_frequency() -> String {
    Frequency::default().key().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_path: None,
            top_limit: default_top_limit(),
            frequency: default_frequency(),
        }
    }
}

impl Settings {
    /// Configured rollup frequency; an unreadable value falls back to monthly.
    pub fn frequency(&self) -> Frequency {
        self.frequency.parse().unwrap_or_default()
    }
}

/// `~/.config/caisse/settings.json`, or relative to the working directory
/// when no home is known.
pub fn settings_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    home.join(".config").join("caisse").join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CaisseError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Resolve a category table path: a leading `~/` is the home directory.
pub fn expand_rules_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
