//! Coordinator actor
//!
//! The single writer of the coordinator's state. Simulator readings, voice
//! client callbacks and control requests all arrive as [`NavCommand`]s on one
//! queue, are applied to the [`Coordinator`] in order, and every resulting
//! move request is handed to the [`VoiceClient`]. Events are forwarded to the
//! event channel after each command.
//!
//! # Example
//!
//! ```rust,ignore
//! use simcom_nav::{run_nav_actor, MemoryStore, NavCommand, SimDataSink};
//! use tokio::sync::mpsc;
//!
//! let (cmd_tx, cmd_rx) = mpsc::channel(256);
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//!
//! tokio::spawn(run_nav_actor(cmd_rx, my_client, MemoryStore::default(), event_tx));
//!
//! // The simulator callback only ever pushes through the sink
//! let sink = SimDataSink::new(cmd_tx.clone());
//! cmd_tx.send(NavCommand::ConnectionStatus { connected: true }).await?;
//! ```

use std::time::{Duration, Instant};

use simcom_core::{ChannelEntry, ChannelId, ChannelInfo, SimComData};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{SessionSnapshot, VoiceClient};
use crate::engine::{Coordinator, NavStatus};
use crate::error::NavError;
use crate::events::NavEvent;
use crate::settings::{NavSettings, SettingsStore};
use crate::state::{ClientId, Mode, MoveRequest, MoveToken};

/// How often in-flight moves are checked for a missing completion
pub const PENDING_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Commands accepted by the coordinator actor
#[derive(Debug)]
pub enum NavCommand {
    /// A simulator reading
    SimData(SimComData),

    /// The voice client connected to or disconnected from a server
    ConnectionStatus {
        /// New connection state
        connected: bool,
    },

    /// A client changed channel, whoever initiated it
    ClientMoved {
        /// Client that moved
        client: ClientId,
        /// Channel it left
        old_channel: Option<ChannelId>,
        /// Channel it entered
        new_channel: ChannelId,
    },

    /// Outcome of a move request
    MoveCompleted {
        /// Token given to `request_move`
        token: MoveToken,
        /// `Err` carries the client's rejection reason
        result: Result<(), String>,
    },

    /// A channel was created or edited on the server
    ChannelUpserted(ChannelEntry),

    /// A channel (and its subtree) was deleted on the server
    ChannelRemoved {
        /// Deleted channel
        id: ChannelId,
    },

    /// Commit a new operating mode
    SetMode {
        /// New mode
        mode: Mode,
    },

    /// Commit a full settings record
    SetSettings {
        /// New settings
        settings: NavSettings,
        /// Channel to send back the outcome
        response: oneshot::Sender<Result<(), NavError>>,
    },

    /// Query the status snapshot
    QueryStatus {
        /// Channel to send back the status
        response: oneshot::Sender<NavStatus>,
    },

    /// Query the channel list below the configured root
    QueryChannels {
        /// Channel to send back the listing
        response: oneshot::Sender<Result<Vec<ChannelInfo>, NavError>>,
    },

    /// Report an error from a collaborator
    ReportError {
        /// Source of the error
        source: String,
        /// Error message
        message: String,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Non-blocking hand-off for simulator readings
///
/// Safe to call from a simulator callback on any thread. When the actor's
/// queue is full the reading is dropped; the next poll supersedes it.
#[derive(Debug, Clone)]
pub struct SimDataSink {
    tx: mpsc::Sender<NavCommand>,
}

impl SimDataSink {
    /// Wrap the actor's command sender
    pub fn new(tx: mpsc::Sender<NavCommand>) -> Self {
        Self { tx }
    }

    /// Push a reading; returns whether it was queued
    pub fn push(&self, reading: SimComData) -> bool {
        match self.tx.try_send(NavCommand::SimData(reading)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Command queue full, dropping sim reading");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Run the coordinator actor
///
/// Runs until `Shutdown` is received or every command sender is dropped.
pub async fn run_nav_actor<C, S>(
    mut cmd_rx: mpsc::Receiver<NavCommand>,
    mut client: C,
    mut store: S,
    event_tx: mpsc::Sender<NavEvent>,
) where
    C: VoiceClient,
    S: SettingsStore,
{
    let mut coordinator = Coordinator::new(load_settings(&store));
    info!(
        "Coordinator actor started in {} mode",
        coordinator.mode().name()
    );

    let mut sweep = interval(PENDING_SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    NavCommand::SimData(reading) => {
                        let request = coordinator.on_sim_data(reading);
                        dispatch(&mut client, &mut coordinator, request);
                    }

                    NavCommand::ConnectionStatus { connected: true } => {
                        match SessionSnapshot::fetch(&mut client) {
                            Ok(session) => {
                                let request = coordinator.connect(
                                    session.client,
                                    session.channel,
                                    session.channels,
                                );
                                dispatch(&mut client, &mut coordinator, request);
                            }
                            Err(e) => {
                                coordinator.disconnect();
                                coordinator.report_error(
                                    "voice client",
                                    format!("session fetch failed: {}", e),
                                );
                            }
                        }
                    }

                    NavCommand::ConnectionStatus { connected: false } => {
                        coordinator.disconnect();
                    }

                    NavCommand::ClientMoved { client: mover, old_channel, new_channel } => {
                        let request = coordinator.on_client_moved(mover, old_channel, new_channel);
                        dispatch(&mut client, &mut coordinator, request);
                    }

                    NavCommand::MoveCompleted { token, result } => {
                        coordinator.on_move_completed(token, result);
                    }

                    NavCommand::ChannelUpserted(entry) => {
                        if let Err(e) = coordinator.upsert_channel(entry) {
                            coordinator.report_error("directory", e.to_string());
                        }
                    }

                    NavCommand::ChannelRemoved { id } => {
                        if let Err(e) = coordinator.remove_channel(id) {
                            coordinator.report_error("directory", e.to_string());
                        }
                    }

                    NavCommand::SetMode { mode } => {
                        let request = coordinator.set_mode(mode);
                        persist(&mut store, &mut coordinator);
                        dispatch(&mut client, &mut coordinator, request);
                    }

                    NavCommand::SetSettings { settings, response } => {
                        match coordinator.apply_settings(settings) {
                            Ok(request) => {
                                persist(&mut store, &mut coordinator);
                                let _ = response.send(Ok(()));
                                dispatch(&mut client, &mut coordinator, request);
                            }
                            Err(e) => {
                                warn!("Settings refused: {}", e);
                                let _ = response.send(Err(e));
                            }
                        }
                    }

                    NavCommand::QueryStatus { response } => {
                        let _ = response.send(coordinator.status());
                    }

                    NavCommand::QueryChannels { response } => {
                        let root = coordinator.settings().root_channel;
                        let listing = coordinator
                            .directory()
                            .channel_list(root)
                            .map_err(NavError::from);
                        let _ = response.send(listing);
                    }

                    NavCommand::ReportError { source, message } => {
                        coordinator.report_error(&source, message);
                    }

                    NavCommand::Shutdown => {
                        info!("Coordinator actor shutting down");
                        break;
                    }
                }
            }

            _ = sweep.tick() => {
                coordinator.expire_pending(Instant::now());
            }
        }

        for event in coordinator.drain_events() {
            let _ = event_tx.send(event).await;
        }
    }

    info!("Coordinator actor stopped");
}

fn load_settings<S: SettingsStore>(store: &S) -> NavSettings {
    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            return NavSettings::default();
        }
    };
    if let Err(e) = settings.validate() {
        warn!("Stored settings unusable ({}), untuned fallback disabled", e);
        settings.untuned_fallback = false;
    }
    settings
}

fn persist<S: SettingsStore>(store: &mut S, coordinator: &mut Coordinator) {
    if let Err(e) = store.save(coordinator.settings()) {
        coordinator.report_error("settings", e.to_string());
    }
}

fn dispatch<C: VoiceClient>(
    client: &mut C,
    coordinator: &mut Coordinator,
    request: Option<MoveRequest>,
) {
    let Some(request) = request else {
        return;
    };
    if let Err(e) = client.request_move(request.client, request.target, request.token) {
        // Never left the client, so it can be completed right here
        coordinator.on_move_completed(request.token, Err(e.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use simcom_core::ComSelector;

    use super::*;
    use crate::settings::MemoryStore;

    type MoveLog = Arc<Mutex<Vec<(ClientId, ChannelId, MoveToken)>>>;

    struct FakeClient {
        moves: MoveLog,
        refuse_moves: bool,
    }

    impl VoiceClient for FakeClient {
        fn channel_snapshot(&mut self) -> Result<Vec<ChannelEntry>, NavError> {
            Ok(vec![
                ChannelEntry::new(1, "Lobby", 0),
                ChannelEntry::new(2, "Tower - 118.300", 1),
                ChannelEntry::new(3, "Ground - 121.900", 1),
            ])
        }

        fn own_client(&mut self) -> Result<ClientId, NavError> {
            Ok(ClientId(5))
        }

        fn channel_of_client(&mut self, _client: ClientId) -> Result<Option<ChannelId>, NavError> {
            Ok(Some(ChannelId(1)))
        }

        fn request_move(
            &mut self,
            client: ClientId,
            target: ChannelId,
            token: MoveToken,
        ) -> Result<(), NavError> {
            if self.refuse_moves {
                return Err(NavError::Client("not permitted".to_string()));
            }
            self.moves.lock().unwrap().push((client, target, token));
            Ok(())
        }
    }

    fn spawn_actor(
        refuse_moves: bool,
        mode: Mode,
    ) -> (mpsc::Sender<NavCommand>, mpsc::Receiver<NavEvent>, MoveLog) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let moves = MoveLog::default();
        let client = FakeClient {
            moves: moves.clone(),
            refuse_moves,
        };
        let store = MemoryStore::new(NavSettings {
            mode,
            ..Default::default()
        });
        tokio::spawn(run_nav_actor(cmd_rx, client, store, event_tx));
        (cmd_tx, event_rx, moves)
    }

    fn tuned(com1: &str) -> SimComData {
        SimComData {
            selected: ComSelector::Com1,
            com1: com1.parse().unwrap(),
            connected: true,
            ..Default::default()
        }
    }

    async fn next_matching(
        event_rx: &mut mpsc::Receiver<NavEvent>,
        pred: impl Fn(&NavEvent) -> bool,
    ) -> NavEvent {
        loop {
            let event = event_rx.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_connect_and_move() {
        let (cmd_tx, mut event_rx, moves) = spawn_actor(false, Mode::Manual);

        cmd_tx
            .send(NavCommand::ConnectionStatus { connected: true })
            .await
            .unwrap();
        let event = event_rx.recv().await.unwrap();
        assert_eq!(
            event,
            NavEvent::Connected {
                client: ClientId(5),
                channel: Some(ChannelId(1)),
                channels: 3,
                rejected: 0,
            }
        );

        assert!(SimDataSink::new(cmd_tx.clone()).push(tuned("121.90")));
        let event = next_matching(&mut event_rx, |e| e.is_move_traffic()).await;
        assert!(matches!(
            event,
            NavEvent::MoveRequested { target: ChannelId(3), .. }
        ));
        assert_eq!(moves.lock().unwrap()[0].1, ChannelId(3));
        assert_eq!(moves.lock().unwrap()[0].0, ClientId(5));

        cmd_tx.send(NavCommand::Shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_request_reported_as_rejection() {
        let (cmd_tx, mut event_rx, moves) = spawn_actor(true, Mode::Auto);

        cmd_tx
            .send(NavCommand::ConnectionStatus { connected: true })
            .await
            .unwrap();
        cmd_tx.send(NavCommand::SimData(tuned("118.30"))).await.unwrap();

        let event = next_matching(&mut event_rx, |e| {
            matches!(e, NavEvent::MoveRejected { .. })
        })
        .await;
        match event {
            NavEvent::MoveRejected { target, reason, .. } => {
                assert_eq!(target, ChannelId(2));
                assert!(reason.contains("not permitted"));
            }
            _ => unreachable!(),
        }
        assert!(moves.lock().unwrap().is_empty());

        // Identical reading does not retry
        cmd_tx.send(NavCommand::SimData(tuned("118.30"))).await.unwrap();
        let (resp_tx, resp_rx) = oneshot::channel();
        cmd_tx
            .send(NavCommand::QueryStatus { response: resp_tx })
            .await
            .unwrap();
        let status = resp_rx.await.unwrap();
        assert_eq!(status.target_channel, Some(ChannelId(2)));
        while let Ok(event) = event_rx.try_recv() {
            assert!(!matches!(event, NavEvent::MoveRequested { .. }));
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_answered_with_error() {
        let (cmd_tx, _event_rx, _moves) = spawn_actor(false, Mode::Manual);

        let (resp_tx, resp_rx) = oneshot::channel();
        cmd_tx
            .send(NavCommand::SetSettings {
                settings: NavSettings {
                    untuned_fallback: true,
                    ..Default::default()
                },
                response: resp_tx,
            })
            .await
            .unwrap();
        assert!(matches!(
            resp_rx.await.unwrap(),
            Err(NavError::InvalidSettings(_))
        ));

        let (resp_tx, resp_rx) = oneshot::channel();
        cmd_tx
            .send(NavCommand::QueryStatus { response: resp_tx })
            .await
            .unwrap();
        assert_eq!(resp_rx.await.unwrap().mode, Mode::Manual);
    }

    #[tokio::test]
    async fn test_channel_query_uses_root() {
        let (cmd_tx, _event_rx, _moves) = spawn_actor(false, Mode::Disabled);
        cmd_tx
            .send(NavCommand::ConnectionStatus { connected: true })
            .await
            .unwrap();

        let (resp_tx, resp_rx) = oneshot::channel();
        cmd_tx
            .send(NavCommand::SetSettings {
                settings: NavSettings {
                    root_channel: Some(ChannelId(1)),
                    ..Default::default()
                },
                response: resp_tx,
            })
            .await
            .unwrap();
        resp_rx.await.unwrap().unwrap();

        let (resp_tx, resp_rx) = oneshot::channel();
        cmd_tx
            .send(NavCommand::QueryChannels { response: resp_tx })
            .await
            .unwrap();
        let listing = resp_rx.await.unwrap().unwrap();
        let ids: Vec<u64> = listing.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_actor_stops_when_senders_dropped() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(4);
        let client = FakeClient {
            moves: MoveLog::default(),
            refuse_moves: false,
        };
        let handle = tokio::spawn(run_nav_actor(cmd_rx, client, MemoryStore::default(), event_tx));

        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
