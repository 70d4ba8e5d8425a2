//! In-memory voice server
//!
//! Stands in for a real voice client and server. Channel edits, user moves
//! and session changes made on the [`LoopbackServer`] are reported to the
//! coordinator actor exactly as a client library's callbacks would be, and
//! the [`LoopbackClient`] handed to the actor carries out its move requests
//! asynchronously.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use simcom_core::{ChannelEntry, ChannelId};
use simcom_nav::{ClientId, MoveToken, NavCommand, NavError, VoiceClient};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Errors raised by the loopback server
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// No such channel on the server
    #[error("channel {0} does not exist")]
    UnknownChannel(ChannelId),

    /// Channel refuses new members
    #[error("channel {0} is locked")]
    Locked(ChannelId),

    /// Channel id already taken
    #[error("channel {0} already exists")]
    DuplicateChannel(ChannelId),

    /// No session
    #[error("not connected")]
    NotConnected,

    /// Shared state lock poisoned
    #[error("server state unavailable")]
    Poisoned,
}

impl From<ServerError> for NavError {
    fn from(e: ServerError) -> Self {
        NavError::Client(e.to_string())
    }
}

#[derive(Debug)]
struct ServerState {
    channels: Vec<ChannelEntry>,
    clients: HashMap<ClientId, ChannelId>,
    locked: HashSet<ChannelId>,
    own: ClientId,
    default_channel: ChannelId,
    connected: bool,
}

impl ServerState {
    fn contains(&self, id: ChannelId) -> bool {
        self.channels.iter().any(|c| c.id == id)
    }

    fn check_target(&self, target: ChannelId) -> Result<(), ServerError> {
        if !self.connected {
            return Err(ServerError::NotConnected);
        }
        if !self.contains(target) {
            return Err(ServerError::UnknownChannel(target));
        }
        if self.locked.contains(&target) {
            return Err(ServerError::Locked(target));
        }
        Ok(())
    }

    // Layout files may carry parent loops, so each id is visited once
    fn subtree(&self, root: ChannelId) -> HashSet<ChannelId> {
        let mut found = HashSet::from([root]);
        let mut queue = vec![root];
        while let Some(parent) = queue.pop() {
            for child in self.channels.iter().filter(|c| c.parent == Some(parent)) {
                if found.insert(child.id) {
                    queue.push(child.id);
                }
            }
        }
        found
    }
}

fn lock(state: &Mutex<ServerState>) -> Result<MutexGuard<'_, ServerState>, ServerError> {
    state.lock().map_err(|_| ServerError::Poisoned)
}

/// The server side: channel layout, client positions, session state
#[derive(Debug, Clone)]
pub struct LoopbackServer {
    state: Arc<Mutex<ServerState>>,
    notify: mpsc::Sender<NavCommand>,
}

impl LoopbackServer {
    /// Create a server with `channels`; the local client `own` joins
    /// `channels[0]` on connection
    pub fn new(
        channels: Vec<ChannelEntry>,
        own: ClientId,
        notify: mpsc::Sender<NavCommand>,
    ) -> Self {
        let default_channel = channels.first().map_or(ChannelId(1), |c| c.id);
        Self {
            state: Arc::new(Mutex::new(ServerState {
                channels,
                clients: HashMap::new(),
                locked: HashSet::new(),
                own,
                default_channel,
                connected: false,
            })),
            notify,
        }
    }

    /// The client-side adapter for the coordinator actor
    ///
    /// Spawns the task that forwards the adapter's replies, so it must be
    /// called inside the runtime.
    pub fn client(&self) -> LoopbackClient {
        let (replies, mut reply_rx) = mpsc::unbounded_channel();
        let notify = self.notify.clone();
        tokio::spawn(async move {
            while let Some(cmd) = reply_rx.recv().await {
                if notify.send(cmd).await.is_err() {
                    debug!("Coordinator gone, dropping move replies");
                    break;
                }
            }
        });

        LoopbackClient {
            state: self.state.clone(),
            replies,
        }
    }

    /// Join the server
    pub async fn connect(&self) -> Result<(), ServerError> {
        {
            let mut state = lock(&self.state)?;
            let own = state.own;
            let lobby = state.default_channel;
            state.connected = true;
            state.clients.insert(own, lobby);
            info!("Loopback server: client {} joined channel {}", own, lobby);
        }
        self.post(NavCommand::ConnectionStatus { connected: true }).await;
        Ok(())
    }

    /// Leave the server
    pub async fn disconnect(&self) -> Result<(), ServerError> {
        {
            let mut state = lock(&self.state)?;
            state.connected = false;
            state.clients.clear();
        }
        self.post(NavCommand::ConnectionStatus { connected: false }).await;
        Ok(())
    }

    /// The user drags themselves into another channel
    pub async fn user_move(&self, target: ChannelId) -> Result<(), ServerError> {
        let (own, old) = {
            let mut state = lock(&self.state)?;
            state.check_target(target)?;
            let own = state.own;
            (own, state.clients.insert(own, target))
        };
        self.post(NavCommand::ClientMoved {
            client: own,
            old_channel: old,
            new_channel: target,
        })
        .await;
        Ok(())
    }

    /// Lock or unlock a channel against moves
    pub fn set_locked(&self, id: ChannelId, locked: bool) -> Result<(), ServerError> {
        let mut state = lock(&self.state)?;
        if !state.contains(id) {
            return Err(ServerError::UnknownChannel(id));
        }
        if locked {
            state.locked.insert(id);
        } else {
            state.locked.remove(&id);
        }
        Ok(())
    }

    /// Create a channel
    pub async fn add_channel(&self, entry: ChannelEntry) -> Result<(), ServerError> {
        {
            let mut state = lock(&self.state)?;
            if state.contains(entry.id) {
                return Err(ServerError::DuplicateChannel(entry.id));
            }
            state.channels.push(entry.clone());
        }
        if self.is_connected() {
            self.post(NavCommand::ChannelUpserted(entry)).await;
        }
        Ok(())
    }

    /// Delete a channel and its subtree; members fall back to the default channel
    pub async fn remove_channel(&self, id: ChannelId) -> Result<(), ServerError> {
        let (evicted, connected) = {
            let mut state = lock(&self.state)?;
            if !state.contains(id) {
                return Err(ServerError::UnknownChannel(id));
            }
            let gone = state.subtree(id);
            state.channels.retain(|c| !gone.contains(&c.id));
            state.locked.retain(|c| !gone.contains(c));
            if gone.contains(&state.default_channel) {
                state.default_channel = state.channels.first().map_or(ChannelId(1), |c| c.id);
            }

            let fallback = state.default_channel;
            let mut evicted = Vec::new();
            for (client, channel) in state.clients.iter_mut() {
                if gone.contains(channel) {
                    evicted.push((*client, *channel, fallback));
                    *channel = fallback;
                }
            }
            (evicted, state.connected)
        };

        if connected {
            self.post(NavCommand::ChannelRemoved { id }).await;
            for (client, old, new) in evicted {
                self.post(NavCommand::ClientMoved {
                    client,
                    old_channel: Some(old),
                    new_channel: new,
                })
                .await;
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).map(|s| s.connected).unwrap_or(false)
    }

    async fn post(&self, cmd: NavCommand) {
        if self.notify.send(cmd).await.is_err() {
            debug!("Coordinator gone, dropping server notification");
        }
    }
}

/// Client-side adapter handed to the coordinator actor
#[derive(Debug)]
pub struct LoopbackClient {
    state: Arc<Mutex<ServerState>>,
    /// Replies in request order, forwarded to the actor by one task
    replies: mpsc::UnboundedSender<NavCommand>,
}

impl VoiceClient for LoopbackClient {
    fn channel_snapshot(&mut self) -> Result<Vec<ChannelEntry>, NavError> {
        let state = lock(&self.state)?;
        if !state.connected {
            return Err(ServerError::NotConnected.into());
        }
        Ok(state.channels.clone())
    }

    fn own_client(&mut self) -> Result<ClientId, NavError> {
        let state = lock(&self.state)?;
        if !state.connected {
            return Err(ServerError::NotConnected.into());
        }
        Ok(state.own)
    }

    fn channel_of_client(&mut self, client: ClientId) -> Result<Option<ChannelId>, NavError> {
        Ok(lock(&self.state)?.clients.get(&client).copied())
    }

    fn request_move(
        &mut self,
        client: ClientId,
        target: ChannelId,
        token: MoveToken,
    ) -> Result<(), NavError> {
        let outcome = {
            let mut state = lock(&self.state)?;
            state
                .check_target(target)
                .map(|()| state.clients.insert(client, target))
        };

        // Completion and the move itself arrive later, like a real server reply
        let replies = match outcome {
            Ok(old) => vec![
                NavCommand::ClientMoved {
                    client,
                    old_channel: old,
                    new_channel: target,
                },
                NavCommand::MoveCompleted {
                    token,
                    result: Ok(()),
                },
            ],
            Err(e) => vec![NavCommand::MoveCompleted {
                token,
                result: Err(e.to_string()),
            }],
        };
        for reply in replies {
            self.replies
                .send(reply)
                .map_err(|_| NavError::Client("reply forwarder stopped".to_string()))?;
        }
        Ok(())
    }
}
