//! Unified event stream for the coordinator
//!
//! Everything the coordinator decides or observes (session lifecycle, mode and
//! settings commits, move traffic, directory changes) is emitted through a
//! single event channel so hosts can log or display it in order.

use simcom_core::ChannelId;

use crate::settings::NavSettings;
use crate::state::{ClientId, Mode, MoveReason, MoveToken};

/// Unified event enum for all coordinator activity
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    // -------------------------------------------------------------------------
    // Session lifecycle events
    // -------------------------------------------------------------------------
    /// A voice server session was established
    Connected {
        /// Local client
        client: ClientId,
        /// Channel the local client is in
        channel: Option<ChannelId>,
        /// Channels loaded into the directory
        channels: usize,
        /// Snapshot entries the directory refused
        rejected: usize,
    },

    /// The voice server session ended; all session state was cleared
    Disconnected,

    /// The simulator came up or went away
    SimConnectivityChanged {
        /// New connectivity
        connected: bool,
    },

    // -------------------------------------------------------------------------
    // Control events
    // -------------------------------------------------------------------------
    /// The operating mode was committed
    ModeChanged {
        /// New mode
        mode: Mode,
    },

    /// A settings record was committed
    SettingsChanged {
        /// Committed settings
        settings: NavSettings,
    },

    // -------------------------------------------------------------------------
    // Move traffic
    // -------------------------------------------------------------------------
    /// A move request was handed to the voice client
    MoveRequested {
        /// Correlation token
        token: MoveToken,
        /// Destination
        target: ChannelId,
        /// Why the move was issued
        reason: MoveReason,
    },

    /// The voice client confirmed a move
    MoveCompleted {
        /// Correlation token
        token: MoveToken,
        /// Destination
        target: ChannelId,
    },

    /// The voice client refused a move
    MoveRejected {
        /// Correlation token
        token: MoveToken,
        /// Destination
        target: ChannelId,
        /// Reason given by the client
        reason: String,
    },

    /// No completion arrived for a move in time
    MoveTimedOut {
        /// Correlation token
        token: MoveToken,
        /// Destination
        target: ChannelId,
    },

    /// The local client's channel changed
    ChannelChanged {
        /// Previous channel
        from: Option<ChannelId>,
        /// New channel
        to: ChannelId,
    },

    // -------------------------------------------------------------------------
    // Directory events
    // -------------------------------------------------------------------------
    /// The channel directory was edited during a session
    DirectoryChanged {
        /// Channel count after the edit
        channels: usize,
    },

    /// A non-fatal failure
    Error {
        /// Source of the error
        source: String,
        /// Error message
        message: String,
    },
}

impl NavEvent {
    /// Check if this event belongs to a move request's lifecycle
    pub fn is_move_traffic(&self) -> bool {
        matches!(
            self,
            NavEvent::MoveRequested { .. }
                | NavEvent::MoveCompleted { .. }
                | NavEvent::MoveRejected { .. }
                | NavEvent::MoveTimedOut { .. }
        )
    }

    /// Check if this is a session lifecycle event
    pub fn is_session_lifecycle(&self) -> bool {
        matches!(
            self,
            NavEvent::Connected { .. }
                | NavEvent::Disconnected
                | NavEvent::SimConnectivityChanged { .. }
        )
    }

    /// Get the move token if this event is associated with a move request
    pub fn move_token(&self) -> Option<MoveToken> {
        match self {
            NavEvent::MoveRequested { token, .. }
            | NavEvent::MoveCompleted { token, .. }
            | NavEvent::MoveRejected { token, .. }
            | NavEvent::MoveTimedOut { token, .. } => Some(*token),
            _ => None,
        }
    }
}
