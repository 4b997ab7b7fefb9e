// User settings
// Loaded from ~/.config/gymdesk/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::APP_DIR;

/// Log filter used when neither settings nor `RUST_LOG` set one.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite membership database
    #[serde(rename = "database.path", skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Default .recon.toml used by `recon run`
    #[serde(rename = "recon.config", skip_serializing_if = "Option::is_none")]
    pub recon_config: Option<PathBuf>,

    /// env_logger filter, e.g. "info" or "gymdesk_recon=debug"
    #[serde(rename = "log.level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.json")
    }

    /// Database used when settings don't name one.
    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("gymdesk.db")
    }

    /// Load settings from the user config dir, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. Missing or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    #[cfg(test)]
    fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Effective database path
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    /// Effective log filter
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
