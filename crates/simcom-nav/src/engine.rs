//! Move coordinator engine
//!
//! The state machine that decides when to move the local client. It owns the
//! session's channel directory, navigation state and settings, and is driven
//! by three inputs: simulator readings, observed channel moves, and move
//! completions. Every decision comes back as an optional [`MoveRequest`] for
//! the caller to hand to the voice client, plus events in the buffer.

use std::fmt;
use std::time::{Duration, Instant};

use simcom_core::{
    resolve, ChannelDirectory, ChannelEntry, ChannelId, ComSelector, Frequency, ResolverQuery,
    SimComData,
};
use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::events::NavEvent;
use crate::settings::NavSettings;
use crate::state::{
    ClientId, Mode, MoveReason, MoveRequest, MoveToken, NavigationState, PendingMove,
};

/// How long a move may wait for its completion before it is dropped
pub const PENDING_MOVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Snapshot of what the coordinator knows, for info panels and logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavStatus {
    /// Voice server session is up
    pub voice_connected: bool,
    /// Simulator link is up
    pub sim_connected: bool,
    /// Operating mode
    pub mode: Mode,
    /// Untuned fallback enabled
    pub untuned_fallback: bool,
    /// Selected radio
    pub selected: ComSelector,
    /// COM1 active frequency
    pub com1: Frequency,
    /// COM1 standby frequency
    pub com1_standby: Frequency,
    /// COM2 active frequency
    pub com2: Frequency,
    /// COM2 standby frequency
    pub com2_standby: Frequency,
    /// Channel the local client is in
    pub current_channel: Option<ChannelId>,
    /// Channel the coordinator is holding the client to
    pub target_channel: Option<ChannelId>,
    /// Channels in the directory
    pub channels: usize,
}

impl fmt::Display for NavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.sim_connected {
            write!(f, "Not connected to Sim.")?;
        } else {
            write!(f, "Connected to Sim.\n\nMode: {}", self.mode.description())?;
            if self.mode != Mode::Disabled {
                let not = if self.untuned_fallback { "" } else { "not " };
                write!(
                    f,
                    ", {}moving with unrecognised freq.\n\n{} radio selected.\n\n\
                     Com 1 Freq: {}\nCom 2 Freq: {}\nCom 1 Stby: {}\nCom 2 Stby: {}",
                    not,
                    self.selected.name(),
                    self.com1,
                    self.com2,
                    self.com1_standby,
                    self.com2_standby,
                )?;
            }
        }

        if self.voice_connected {
            let show = |c: Option<ChannelId>| c.map_or_else(|| "-".to_string(), |c| c.to_string());
            write!(
                f,
                "\n\nChannel: {} (target {}, {} channels known)",
                show(self.current_channel),
                show(self.target_channel),
                self.channels
            )
        } else {
            write!(f, "\n\nNot connected to a voice server.")
        }
    }
}

/// The move coordinator
pub struct Coordinator {
    settings: NavSettings,
    directory: ChannelDirectory,
    nav: Option<NavigationState>,
    last_reading: Option<SimComData>,
    next_token: u64,
    event_buffer: Vec<NavEvent>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(NavSettings::default())
    }
}

impl Coordinator {
    /// Create a coordinator with the given settings, not yet connected
    pub fn new(settings: NavSettings) -> Self {
        Self {
            settings,
            directory: ChannelDirectory::new(),
            nav: None,
            last_reading: None,
            next_token: 1,
            event_buffer: Vec::new(),
        }
    }

    /// Get the settings in force
    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    /// Get the operating mode
    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    /// Get the session's channel directory
    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    /// Get the session's navigation state
    pub fn navigation(&self) -> Option<&NavigationState> {
        self.nav.as_ref()
    }

    /// Whether a voice server session is up
    pub fn is_connected(&self) -> bool {
        self.nav.is_some()
    }

    /// Most recent simulator reading
    pub fn last_reading(&self) -> Option<SimComData> {
        self.last_reading
    }

    /// Start a voice server session
    ///
    /// Rebuilds the directory from `channels` and re-evaluates the last
    /// simulator reading, which may produce a move straight away.
    pub fn connect(
        &mut self,
        client: ClientId,
        current: Option<ChannelId>,
        channels: Vec<ChannelEntry>,
    ) -> Option<MoveRequest> {
        let rejected = self.directory.load_snapshot(channels);
        self.nav = Some(NavigationState::new(client, current));

        info!(
            "Voice session up: client {} in channel {:?}, {} channels ({} rejected)",
            client,
            current,
            self.directory.len(),
            rejected
        );
        self.event_buffer.push(NavEvent::Connected {
            client,
            channel: current,
            channels: self.directory.len(),
            rejected,
        });

        self.evaluate()
    }

    /// End the voice server session and drop everything tied to it
    pub fn disconnect(&mut self) {
        self.directory.delete_all_channels();
        if self.nav.take().is_some() {
            info!("Voice session down, navigation state cleared");
            self.event_buffer.push(NavEvent::Disconnected);
        }
    }

    /// Handle a simulator reading
    pub fn on_sim_data(&mut self, reading: SimComData) -> Option<MoveRequest> {
        let was_connected = self.last_reading.is_some_and(|r| r.connected);
        if was_connected != reading.connected {
            info!(
                "Simulator {}",
                if reading.connected { "connected" } else { "disconnected" }
            );
            self.event_buffer.push(NavEvent::SimConnectivityChanged {
                connected: reading.connected,
            });
        }
        self.last_reading = Some(reading);

        if !reading.connected {
            return None;
        }
        debug!("Sim data: {}", reading);
        self.evaluate()
    }

    /// Handle an observed channel move of any client
    pub fn on_client_moved(
        &mut self,
        client: ClientId,
        old: Option<ChannelId>,
        new: ChannelId,
    ) -> Option<MoveRequest> {
        let mode = self.settings.mode;
        let nav = self.nav.as_mut()?;
        if client != nav.client {
            return None;
        }

        let from = nav.current_channel;
        nav.current_channel = Some(new);
        if from != Some(new) {
            self.event_buffer.push(NavEvent::ChannelChanged { from, to: new });
        }

        // One of our own requests landing
        if nav.is_pending(new) {
            debug!("Client {} arrived in {} as requested", client, new);
            return None;
        }

        match (mode, nav.last_target) {
            (Mode::Auto, Some(last)) if last != new => {
                info!(
                    "Client moved {:?} -> {} while locked, returning to {}",
                    old, new, last
                );
                Some(self.issue_move(last, MoveReason::Correction))
            }
            (Mode::Auto, _) => {
                debug!("Accepted move to {}", new);
                None
            }
            (Mode::Disabled | Mode::Manual, _) => {
                debug!("Accepted move to {}, now tracking it", new);
                nav.last_target = Some(new);
                None
            }
        }
    }

    /// Handle the voice client's report on a move request
    pub fn on_move_completed(&mut self, token: MoveToken, result: Result<(), String>) {
        let Some(nav) = self.nav.as_mut() else {
            debug!("Completion for {} after the session ended", token);
            return;
        };
        let Some(pending) = nav.pending.remove(&token) else {
            debug!("Completion for unknown or expired {}", token);
            return;
        };

        match result {
            Ok(()) => {
                debug!("{} to {} completed", token, pending.target);
                self.event_buffer.push(NavEvent::MoveCompleted {
                    token,
                    target: pending.target,
                });
            }
            Err(reason) => {
                warn!("{} to {} rejected: {}", token, pending.target, reason);
                nav.rejected_target = Some(pending.target);
                self.event_buffer.push(NavEvent::MoveRejected {
                    token,
                    target: pending.target,
                    reason,
                });
            }
        }
    }

    /// Commit a new operating mode
    ///
    /// Re-evaluates the last reading. A rejected target stays rejected until
    /// a different target is resolved.
    pub fn set_mode(&mut self, mode: Mode) -> Option<MoveRequest> {
        info!("Mode: {} ({})", mode.name(), mode.description());
        self.settings.mode = mode;
        self.event_buffer.push(NavEvent::ModeChanged { mode });
        self.evaluate()
    }

    /// Commit a full settings record
    ///
    /// Invalid settings are refused and the previous record stays in force.
    pub fn apply_settings(&mut self, settings: NavSettings) -> Result<Option<MoveRequest>, NavError> {
        settings.validate()?;

        let mode_changed = settings.mode != self.settings.mode;
        self.settings = settings.clone();
        info!(
            "Settings: mode {}, root {:?}, fallback {} -> {:?}, tolerance {}",
            settings.mode.name(),
            settings.root_channel,
            settings.untuned_fallback,
            settings.untuned_channel,
            settings.match_tolerance
        );

        if mode_changed {
            self.event_buffer.push(NavEvent::ModeChanged {
                mode: settings.mode,
            });
        }
        self.event_buffer.push(NavEvent::SettingsChanged { settings });

        Ok(self.evaluate())
    }

    /// Apply a live channel creation or edit
    pub fn upsert_channel(&mut self, entry: ChannelEntry) -> Result<(), NavError> {
        if self.nav.is_none() {
            return Err(NavError::NotConnected);
        }
        debug!("Channel {} updated: {:?}", entry.id, entry.name);
        self.directory.upsert(entry)?;
        self.event_buffer.push(NavEvent::DirectoryChanged {
            channels: self.directory.len(),
        });
        Ok(())
    }

    /// Apply a live channel deletion
    ///
    /// Returns every removed id, the channel's subtree included.
    pub fn remove_channel(&mut self, id: ChannelId) -> Result<Vec<ChannelId>, NavError> {
        let Some(nav) = self.nav.as_mut() else {
            return Err(NavError::NotConnected);
        };
        let removed = self.directory.remove_channel(id)?;

        if nav.last_target.is_some_and(|t| removed.contains(&t)) {
            nav.last_target = None;
        }
        if nav.rejected_target.is_some_and(|t| removed.contains(&t)) {
            nav.rejected_target = None;
        }

        debug!("Removed channel {} and {} below it", id, removed.len() - 1);
        self.event_buffer.push(NavEvent::DirectoryChanged {
            channels: self.directory.len(),
        });
        Ok(removed)
    }

    /// Drop moves that have waited longer than [`PENDING_MOVE_TIMEOUT`]
    pub fn expire_pending(&mut self, now: Instant) -> Vec<MoveToken> {
        let Some(nav) = self.nav.as_mut() else {
            return Vec::new();
        };

        let mut expired: Vec<(MoveToken, PendingMove)> = nav
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.issued_at) >= PENDING_MOVE_TIMEOUT)
            .map(|(t, p)| (*t, *p))
            .collect();
        expired.sort_by_key(|(t, _)| *t);

        for (token, pending) in &expired {
            nav.pending.remove(token);
            warn!("{} to {} timed out", token, pending.target);
            self.event_buffer.push(NavEvent::MoveTimedOut {
                token: *token,
                target: pending.target,
            });
        }

        expired.into_iter().map(|(t, _)| t).collect()
    }

    /// Record a non-fatal failure from a collaborator
    pub fn report_error(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {}", source, message);
        self.event_buffer.push(NavEvent::Error {
            source: source.to_string(),
            message,
        });
    }

    /// Current status snapshot
    pub fn status(&self) -> NavStatus {
        let reading = self.last_reading.unwrap_or_default();
        NavStatus {
            voice_connected: self.nav.is_some(),
            sim_connected: reading.connected,
            mode: self.settings.mode,
            untuned_fallback: self.settings.untuned_fallback,
            selected: reading.selected,
            com1: reading.com1,
            com1_standby: reading.com1_standby,
            com2: reading.com2,
            com2_standby: reading.com2_standby,
            current_channel: self.nav.as_ref().and_then(|n| n.current_channel),
            target_channel: self.nav.as_ref().and_then(|n| n.last_target),
            channels: self.directory.len(),
        }
    }

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    // Decide where the client belongs for the last reading and issue the move
    fn evaluate(&mut self) -> Option<MoveRequest> {
        let reading = self.last_reading.filter(|r| r.connected)?;
        let settings = &self.settings;
        let nav = self.nav.as_mut()?;

        if settings.mode == Mode::Disabled {
            nav.last_target = nav.current_channel;
            return None;
        }

        let resolved = reading.active_frequency().and_then(|frequency| {
            let query = ResolverQuery::new(frequency, settings.root_channel)
                .with_tolerance(settings.match_tolerance);
            resolve(&self.directory, &query)
        });

        let (target, reason) = match resolved {
            Some(id) => (Some(id), MoveReason::Tuned),
            None if settings.untuned_fallback => (settings.untuned_channel, MoveReason::Untuned),
            None => (nav.last_target, MoveReason::Hold),
        };
        let Some(target) = target else {
            debug!("No target for {:?}", reading.active_frequency());
            return None;
        };
        nav.last_target = Some(target);

        if nav.current_channel == Some(target) {
            return None;
        }
        if nav.is_pending(target) {
            debug!("Move to {} already in flight", target);
            return None;
        }
        if nav.rejected_target == Some(target) {
            debug!("Not retrying rejected move to {}", target);
            return None;
        }
        nav.rejected_target = None;

        Some(self.issue_move(target, reason))
    }

    fn issue_move(&mut self, target: ChannelId, reason: MoveReason) -> MoveRequest {
        let token = MoveToken(self.next_token);
        self.next_token += 1;

        // Only reached with a live session
        let client = self.nav.as_ref().map_or(ClientId(0), |n| n.client);
        if let Some(nav) = self.nav.as_mut() {
            nav.pending.insert(
                token,
                PendingMove {
                    target,
                    issued_at: Instant::now(),
                },
            );
        }

        let path = self.directory.path(target).unwrap_or_else(|| target.to_string());
        info!("Moving to {} ({}) [{}]", path, reason.name(), token);
        self.event_buffer.push(NavEvent::MoveRequested {
            token,
            target,
            reason,
        });

        MoveRequest {
            token,
            client,
            target,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: ClientId = ClientId(7);

    fn tower_layout() -> Vec<ChannelEntry> {
        vec![
            ChannelEntry::new(1, "Lobby", 0),
            ChannelEntry::new(2, "Tower - 118.300", 1),
            ChannelEntry::new(3, "Ground - 121.900", 1),
            ChannelEntry::new(4, "Untuned", 0),
        ]
    }

    fn reading(com1: &str) -> SimComData {
        SimComData {
            selected: ComSelector::Com1,
            com1: com1.parse().unwrap(),
            connected: true,
            ..Default::default()
        }
    }

    fn coordinator(mode: Mode) -> Coordinator {
        let mut coord = Coordinator::new(NavSettings {
            mode,
            root_channel: Some(ChannelId(1)),
            ..Default::default()
        });
        assert!(coord.connect(ME, Some(ChannelId(1)), tower_layout()).is_none());
        coord.drain_events();
        coord
    }

    #[test]
    fn test_tuning_issues_move() {
        let mut coord = coordinator(Mode::Manual);

        let req = coord.on_sim_data(reading("118.30")).unwrap();
        assert_eq!(req.target, ChannelId(2));
        assert_eq!(req.client, ME);
        assert_eq!(req.reason, MoveReason::Tuned);
        assert_eq!(coord.navigation().unwrap().last_target, Some(ChannelId(2)));

        // Same reading while the move is in flight
        assert!(coord.on_sim_data(reading("118.30")).is_none());
    }

    #[test]
    fn test_sim_disconnected_reading_ignored() {
        let mut coord = coordinator(Mode::Auto);
        let mut data = reading("118.30");
        data.connected = false;

        assert!(coord.on_sim_data(data).is_none());
        assert!(coord.navigation().unwrap().last_target.is_none());
    }

    #[test]
    fn test_readings_before_connect_are_replayed() {
        let mut coord = Coordinator::new(NavSettings {
            mode: Mode::Auto,
            ..Default::default()
        });
        assert!(coord.on_sim_data(reading("121.90")).is_none());

        let req = coord.connect(ME, Some(ChannelId(1)), tower_layout()).unwrap();
        assert_eq!(req.target, ChannelId(3));
    }

    #[test]
    fn test_disabled_tracks_current() {
        let mut coord = coordinator(Mode::Disabled);
        assert!(coord.on_sim_data(reading("118.30")).is_none());
        assert_eq!(coord.navigation().unwrap().last_target, Some(ChannelId(1)));

        assert!(coord.on_client_moved(ME, Some(ChannelId(1)), ChannelId(3)).is_none());
        assert!(coord.on_sim_data(reading("121.90")).is_none());
        assert_eq!(coord.navigation().unwrap().last_target, Some(ChannelId(3)));
    }

    #[test]
    fn test_untuned_fallback() {
        let mut coord = coordinator(Mode::Manual);
        coord
            .apply_settings(NavSettings {
                mode: Mode::Manual,
                root_channel: Some(ChannelId(1)),
                untuned_fallback: true,
                untuned_channel: Some(ChannelId(4)),
                match_tolerance: 0,
            })
            .unwrap();

        let req = coord.on_sim_data(reading("130.00")).unwrap();
        assert_eq!(req.target, ChannelId(4));
        assert_eq!(req.reason, MoveReason::Untuned);
    }

    #[test]
    fn test_invalid_settings_refused() {
        let mut coord = coordinator(Mode::Manual);
        let result = coord.apply_settings(NavSettings {
            untuned_fallback: true,
            ..Default::default()
        });
        assert!(matches!(result, Err(NavError::InvalidSettings(_))));
        assert_eq!(coord.mode(), Mode::Manual);
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_auto_corrects_outside_move() {
        let mut coord = coordinator(Mode::Auto);
        let req = coord.on_sim_data(reading("118.30")).unwrap();
        coord.on_client_moved(ME, Some(ChannelId(1)), ChannelId(2));
        coord.on_move_completed(req.token, Ok(()));

        let correction = coord
            .on_client_moved(ME, Some(ChannelId(2)), ChannelId(3))
            .unwrap();
        assert_eq!(correction.target, ChannelId(2));
        assert_eq!(correction.reason, MoveReason::Correction);
        assert_ne!(correction.token, req.token);
    }

    #[test]
    fn test_other_clients_ignored() {
        let mut coord = coordinator(Mode::Auto);
        coord.on_sim_data(reading("118.30"));
        assert!(coord
            .on_client_moved(ClientId(99), Some(ChannelId(2)), ChannelId(3))
            .is_none());
        assert_eq!(coord.navigation().unwrap().current_channel, Some(ChannelId(1)));
    }

    #[test]
    fn test_rejected_move_not_retried() {
        let mut coord = coordinator(Mode::Manual);
        let req = coord.on_sim_data(reading("118.30")).unwrap();
        coord.on_move_completed(req.token, Err("channel is full".to_string()));

        assert!(coord.on_sim_data(reading("118.30")).is_none());
        assert_eq!(coord.navigation().unwrap().last_target, Some(ChannelId(2)));

        // A different target goes out, and going back is allowed again
        assert_eq!(coord.on_sim_data(reading("121.90")).unwrap().target, ChannelId(3));
        assert_eq!(coord.on_sim_data(reading("118.30")).unwrap().target, ChannelId(2));
    }

    #[test]
    fn test_mode_change_keeps_rejection_for_same_target() {
        let mut coord = coordinator(Mode::Manual);
        let req = coord.on_sim_data(reading("118.30")).unwrap();
        coord.on_move_completed(req.token, Err("denied".to_string()));

        assert!(coord.set_mode(Mode::Auto).is_none());
        assert_eq!(coord.navigation().unwrap().rejected_target, Some(ChannelId(2)));

        // Retuning to a different channel re-enables moves
        assert_eq!(coord.on_sim_data(reading("121.90")).unwrap().target, ChannelId(3));
        assert!(coord.navigation().unwrap().rejected_target.is_none());
    }

    #[test]
    fn test_pending_moves_expire() {
        let mut coord = coordinator(Mode::Manual);
        let req = coord.on_sim_data(reading("118.30")).unwrap();
        coord.drain_events();

        assert!(coord.expire_pending(Instant::now()).is_empty());
        let later = Instant::now() + PENDING_MOVE_TIMEOUT;
        assert_eq!(coord.expire_pending(later), vec![req.token]);
        assert_eq!(
            coord.drain_events(),
            vec![NavEvent::MoveTimedOut {
                token: req.token,
                target: ChannelId(2)
            }]
        );

        // Late completion is ignored
        coord.on_move_completed(req.token, Ok(()));
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_disconnect_clears_session() {
        let mut coord = coordinator(Mode::Auto);
        coord.on_sim_data(reading("118.30"));
        coord.disconnect();

        assert!(!coord.is_connected());
        assert!(coord.directory().is_empty());
        assert!(coord.on_client_moved(ME, None, ChannelId(3)).is_none());
        assert!(coord.drain_events().contains(&NavEvent::Disconnected));
    }

    #[test]
    fn test_removed_target_forgotten() {
        let mut coord = coordinator(Mode::Manual);
        coord.on_sim_data(reading("118.30"));

        let removed = coord.remove_channel(ChannelId(1)).unwrap();
        assert_eq!(removed, vec![ChannelId(1), ChannelId(2), ChannelId(3)]);
        assert!(coord.navigation().unwrap().last_target.is_none());
    }

    #[test]
    fn test_channel_edits_need_session() {
        let mut coord = Coordinator::default();
        assert_eq!(
            coord.upsert_channel(ChannelEntry::new(5, "Approach - 119.100", 0)),
            Err(NavError::NotConnected)
        );
    }

    #[test]
    fn test_status_text() {
        let mut coord = coordinator(Mode::Auto);
        assert!(coord.status().to_string().starts_with("Not connected to Sim."));

        coord.on_sim_data(reading("118.30"));
        let text = coord.status().to_string();
        assert!(text.starts_with(
            "Connected to Sim.\n\nMode: Enabled and locked, not moving with unrecognised freq."
        ));
        assert!(text.contains("COM1 radio selected."));
        assert!(text.contains("Com 1 Freq: 118.30"));

        coord.set_mode(Mode::Disabled);
        assert!(coord
            .status()
            .to_string()
            .starts_with("Connected to Sim.\n\nMode: Disabled\n\n"));
    }
}
