//! Persisted coordinator settings
//!
//! The settings record is owned by a [`SettingsStore`] collaborator. The
//! actor reads it once at start and writes it back on every commit.

use serde::{Deserialize, Serialize};
use simcom_core::ChannelId;

use crate::error::NavError;
use crate::state::Mode;

/// Persisted coordinator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavSettings {
    /// Operating mode
    pub mode: Mode,
    /// Search root for frequency resolution (None searches every channel)
    pub root_channel: Option<ChannelId>,
    /// Move to `untuned_channel` when nothing matches
    pub untuned_fallback: bool,
    /// Channel used when nothing matches
    pub untuned_channel: Option<ChannelId>,
    /// Accepted distance in hundredths of a MHz when nothing matches exactly
    pub match_tolerance: u32,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Disabled,
            root_channel: None,
            untuned_fallback: false,
            untuned_channel: None,
            match_tolerance: 0,
        }
    }
}

impl NavSettings {
    /// Check the settings can be committed
    pub fn validate(&self) -> Result<(), NavError> {
        if self.untuned_fallback && self.untuned_channel.is_none() {
            return Err(NavError::InvalidSettings(
                "untuned fallback is enabled but no untuned channel is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where [`NavSettings`] are persisted
pub trait SettingsStore: Send {
    /// Read the stored settings
    fn load(&self) -> Result<NavSettings, NavError>;

    /// Persist a committed settings record
    fn save(&mut self, settings: &NavSettings) -> Result<(), NavError>;
}

/// In-memory store, for hosts without persistence and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    settings: NavSettings,
    saves: usize,
}

impl MemoryStore {
    /// Create a store holding `settings`
    pub fn new(settings: NavSettings) -> Self {
        Self { settings, saves: 0 }
    }

    /// Number of commits written so far
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Last saved settings
    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<NavSettings, NavError> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &NavSettings) -> Result<(), NavError> {
        self.settings = settings.clone();
        self.saves += 1;
        Ok(())
    }
}
