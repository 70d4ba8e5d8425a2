//! Application settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simcom_nav::{NavError, NavSettings, SettingsStore};
use simcom_sim::VirtualSimConfig;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Coordinator settings (mode, root, untuned fallback, tolerance)
    #[serde(default)]
    pub navigation: NavSettings,
    /// Channel layout JSON file; the built-in demo layout when unset
    #[serde(default)]
    pub layout_file: Option<PathBuf>,
    /// Name the local client shows on the loopback server
    #[serde(default = "default_nickname")]
    pub nickname: String,
    /// Initial state of the virtual simulator
    #[serde(default)]
    pub simulator: VirtualSimConfig,
}

fn default_nickname() -> String {
    "Pilot".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            navigation: NavSettings::default(),
            layout_file: None,
            nickname: default_nickname(),
            simulator: VirtualSimConfig::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for simcom
    /// Uses $XDG_CONFIG_HOME/simcom on Linux/macOS, falls back to ~/.config/simcom
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("simcom"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("simcom"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, defaults when missing or unreadable
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

/// Settings store backed by the settings file
///
/// Commits from the coordinator replace the navigation section and rewrite
/// the whole file, so the other sections survive.
#[derive(Debug)]
pub struct FileStore {
    settings: Settings,
    path: Option<PathBuf>,
}

impl FileStore {
    /// Store writing to the default settings path
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            path: Settings::settings_path(),
        }
    }

    /// Store writing to `path`
    #[cfg(test)]
    pub fn at(settings: Settings, path: PathBuf) -> Self {
        Self {
            settings,
            path: Some(path),
        }
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<NavSettings, NavError> {
        Ok(self.settings.navigation.clone())
    }

    fn save(&mut self, settings: &NavSettings) -> Result<(), NavError> {
        self.settings.navigation = settings.clone();
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| NavError::Settings("Could not determine settings path".to_string()))?;
        self.settings.save_to(path).map_err(NavError::Settings)
    }
}
