//! Voice client adapter
//!
//! The coordinator never talks to a voice client library directly. A host
//! implements [`VoiceClient`] on top of whatever client it embeds in, and
//! feeds the client's callbacks back in as [`crate::NavCommand`]s.

use simcom_core::{ChannelEntry, ChannelId};

use crate::error::NavError;
use crate::state::{ClientId, MoveToken};

/// Calls the coordinator makes into the voice client
///
/// Every method is called from the actor, so none of them may block on the
/// voice server. `request_move` only queues the move; its outcome arrives
/// later as `NavCommand::MoveCompleted` carrying the same token, and the
/// resulting channel change as `NavCommand::ClientMoved`.
pub trait VoiceClient: Send {
    /// Every channel visible in the current session, in server order
    fn channel_snapshot(&mut self) -> Result<Vec<ChannelEntry>, NavError>;

    /// The local client's id
    fn own_client(&mut self) -> Result<ClientId, NavError>;

    /// The channel a client is currently in
    fn channel_of_client(&mut self, client: ClientId) -> Result<Option<ChannelId>, NavError>;

    /// Ask the server to move a client
    ///
    /// An `Err` means the request never left; it is handled like a rejection.
    fn request_move(
        &mut self,
        client: ClientId,
        target: ChannelId,
        token: MoveToken,
    ) -> Result<(), NavError>;
}

/// Live session details read on connection
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Local client
    pub client: ClientId,
    /// Channel the local client is in
    pub channel: Option<ChannelId>,
    /// Full channel list
    pub channels: Vec<ChannelEntry>,
}

impl SessionSnapshot {
    /// Read everything the coordinator needs from a freshly connected client
    pub fn fetch<C: VoiceClient + ?Sized>(client: &mut C) -> Result<Self, NavError> {
        let me = client.own_client()?;
        let channel = client.channel_of_client(me)?;
        let channels = client.channel_snapshot()?;
        Ok(Self {
            client: me,
            channel,
            channels,
        })
    }
}
