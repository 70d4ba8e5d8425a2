//! Navigation state tracking

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use simcom_core::ChannelId;

use crate::error::NavError;

/// Voice client identifier within a server session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u16);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation token attached to a move request and echoed in its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveToken(pub u64);

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move-{}", self.0)
    }
}

/// Operating mode of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Track the user's channel, never move
    #[default]
    Disabled,
    /// Move on tuning, let the user wander off
    Manual,
    /// Move on tuning and pull the user back when they leave
    Auto,
}

impl Mode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Manual => "Manual",
            Self::Auto => "Auto",
        }
    }

    /// Get description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Manual => "Enabled but not locked",
            Self::Auto => "Enabled and locked",
        }
    }
}

impl FromStr for Mode {
    type Err = NavError;

    /// Accepts mode names and the short hotkey keywords
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "disable" | "off" => Ok(Self::Disabled),
            "manual" | "man" => Ok(Self::Manual),
            "auto" | "automatic" | "aut" => Ok(Self::Auto),
            _ => Err(NavError::UnknownMode(s.to_string())),
        }
    }
}

/// Why a move was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveReason {
    /// The tuned frequency resolved to a channel
    Tuned,
    /// Nothing matched and the untuned fallback is on
    Untuned,
    /// Nothing matched; returning to the last target
    Hold,
    /// Auto mode pulling the user back after an outside move
    Correction,
}

impl MoveReason {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tuned => "tuned",
            Self::Untuned => "untuned fallback",
            Self::Hold => "hold",
            Self::Correction => "locked correction",
        }
    }
}

/// A move the voice client should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Correlation token
    pub token: MoveToken,
    /// Client to move (always the local client)
    pub client: ClientId,
    /// Destination channel
    pub target: ChannelId,
    /// Why the move was issued
    pub reason: MoveReason,
}

/// A move request waiting for its completion report
#[derive(Debug, Clone, Copy)]
pub struct PendingMove {
    /// Destination channel
    pub target: ChannelId,
    /// When the request went out
    pub issued_at: Instant,
}

/// Per-session navigation state
///
/// Exists only while connected to a voice server; dropped on disconnect.
#[derive(Debug, Clone)]
pub struct NavigationState {
    /// Local client
    pub client: ClientId,
    /// Channel the local client is in
    pub current_channel: Option<ChannelId>,
    /// Channel the coordinator last sent the client to (or is tracking)
    pub last_target: Option<ChannelId>,
    /// Moves awaiting completion
    pub pending: HashMap<MoveToken, PendingMove>,
    /// Target of the most recent rejected move
    pub rejected_target: Option<ChannelId>,
}

impl NavigationState {
    /// Create state for a fresh session
    pub fn new(client: ClientId, current_channel: Option<ChannelId>) -> Self {
        Self {
            client,
            current_channel,
            last_target: None,
            pending: HashMap::new(),
            rejected_target: None,
        }
    }

    /// Whether a move to `target` is still in flight
    pub fn is_pending(&self, target: ChannelId) -> bool {
        self.pending.values().any(|p| p.target == target)
    }
}
