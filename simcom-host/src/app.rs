//! Console application state
//!
//! Turns parsed console commands into messages for the coordinator actor,
//! the virtual simulator task and the loopback server, and prints the
//! answers.

use std::fmt::Write as _;

use simcom_core::ChannelInfo;
use simcom_nav::{NavCommand, NavEvent, NavSettings};
use simcom_sim::{SimError, VirtualSimCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::console::{ConsoleCommand, HELP};
use crate::server::LoopbackServer;

/// Handles to everything the console drives
pub struct SimComApp {
    /// Last committed coordinator settings
    navigation: NavSettings,
    nav_tx: mpsc::Sender<NavCommand>,
    sim_tx: mpsc::Sender<VirtualSimCommand>,
    server: LoopbackServer,
}

impl SimComApp {
    /// Create the app around running tasks
    pub fn new(
        navigation: NavSettings,
        nav_tx: mpsc::Sender<NavCommand>,
        sim_tx: mpsc::Sender<VirtualSimCommand>,
        server: LoopbackServer,
    ) -> Self {
        Self {
            navigation,
            nav_tx,
            sim_tx,
            server,
        }
    }

    /// Execute one command and return the text to print, if any
    pub async fn execute(&mut self, command: ConsoleCommand) -> Option<String> {
        match command {
            ConsoleCommand::Tune(radio, frequency) => {
                let (tx, rx) = oneshot::channel();
                self.send_sim(VirtualSimCommand::SetActive {
                    radio,
                    frequency,
                    response: Some(tx),
                })
                .await;
                sim_outcome(rx).await
            }
            ConsoleCommand::Standby(radio, frequency) => {
                let (tx, rx) = oneshot::channel();
                self.send_sim(VirtualSimCommand::SetStandby {
                    radio,
                    frequency,
                    response: Some(tx),
                })
                .await;
                sim_outcome(rx).await
            }
            ConsoleCommand::Swap(radio) => {
                self.send_sim(VirtualSimCommand::Swap(radio)).await;
                None
            }
            ConsoleCommand::Select(selector) => {
                self.send_sim(VirtualSimCommand::Select(selector)).await;
                None
            }
            ConsoleCommand::SimPower(on) => {
                self.send_sim(VirtualSimCommand::SetConnected(on)).await;
                None
            }

            ConsoleCommand::Connect => failure(self.server.connect().await),
            ConsoleCommand::Disconnect => failure(self.server.disconnect().await),
            ConsoleCommand::Move(id) => failure(self.server.user_move(id).await),
            ConsoleCommand::Lock(id, locked) => failure(self.server.set_locked(id, locked)),
            ConsoleCommand::Add(entry) => failure(self.server.add_channel(entry).await),
            ConsoleCommand::Remove(id) => failure(self.server.remove_channel(id).await),

            ConsoleCommand::Mode(mode) => {
                self.send_nav(NavCommand::SetMode { mode }).await;
                self.navigation.mode = mode;
                None
            }
            ConsoleCommand::Root(root) => {
                let mut settings = self.navigation.clone();
                settings.root_channel = root;
                self.commit(settings).await
            }
            ConsoleCommand::Untuned(channel) => {
                let mut settings = self.navigation.clone();
                settings.untuned_fallback = channel.is_some();
                settings.untuned_channel = channel.or(settings.untuned_channel);
                self.commit(settings).await
            }
            ConsoleCommand::Tolerance(tolerance) => {
                let mut settings = self.navigation.clone();
                settings.match_tolerance = tolerance;
                self.commit(settings).await
            }

            ConsoleCommand::Status => {
                let (tx, rx) = oneshot::channel();
                self.send_nav(NavCommand::QueryStatus { response: tx }).await;
                rx.await.ok().map(|status| status.to_string())
            }
            ConsoleCommand::List => {
                let (tx, rx) = oneshot::channel();
                self.send_nav(NavCommand::QueryChannels { response: tx }).await;
                match rx.await {
                    Ok(Ok(list)) => Some(render_channels(&list)),
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(_) => None,
                }
            }
            ConsoleCommand::Help => Some(HELP.to_string()),
            ConsoleCommand::Quit => None,
        }
    }

    /// Stop the coordinator and the simulator
    pub async fn shutdown(&self) {
        self.send_nav(NavCommand::Shutdown).await;
        self.send_sim(VirtualSimCommand::Shutdown).await;
    }

    async fn commit(&mut self, settings: NavSettings) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        self.send_nav(NavCommand::SetSettings {
            settings: settings.clone(),
            response: tx,
        })
        .await;
        match rx.await {
            Ok(Ok(())) => {
                self.navigation = settings;
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("coordinator not running".to_string()),
        }
    }

    async fn send_nav(&self, cmd: NavCommand) {
        if self.nav_tx.send(cmd).await.is_err() {
            warn!("Coordinator actor is gone");
        }
    }

    async fn send_sim(&self, cmd: VirtualSimCommand) {
        if self.sim_tx.send(cmd).await.is_err() {
            warn!("Virtual simulator is gone");
        }
    }
}

fn failure<E: std::fmt::Display>(result: Result<(), E>) -> Option<String> {
    result.err().map(|e| e.to_string())
}

async fn sim_outcome(rx: oneshot::Receiver<Result<(), SimError>>) -> Option<String> {
    match rx.await {
        Ok(Err(e)) => Some(e.to_string()),
        _ => None,
    }
}

/// Indented channel tree, one channel per line
pub fn render_channels(list: &[ChannelInfo]) -> String {
    let mut out = String::new();
    for channel in list {
        let indent = channel.depth * 2;
        let _ = write!(out, "{:indent$}{} [{}]", "", channel.name, channel.id);
        if let Some(frequency) = channel.frequency {
            let _ = write!(out, " <{}>", frequency);
        }
        out.push('\n');
    }
    out.pop();
    out
}

/// Log coordinator events until the actor goes away
pub async fn log_events(mut event_rx: mpsc::Receiver<NavEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            NavEvent::Connected {
                client,
                channel,
                channels,
                rejected,
            } => info!(
                "Connected as client {} in {:?} with {} channels ({} rejected)",
                client, channel, channels, rejected
            ),
            NavEvent::MoveRejected { token, target, reason } => {
                warn!("{} to channel {} rejected: {}", token, target, reason)
            }
            NavEvent::MoveTimedOut { token, target } => {
                warn!("{} to channel {} never completed", token, target)
            }
            NavEvent::ChannelChanged { from, to } => {
                info!("Now in channel {} (was {:?})", to, from)
            }
            NavEvent::Error { source, message } => warn!("{}: {}", source, message),
            other => tracing::debug!("{:?}", other),
        }
    }
}
