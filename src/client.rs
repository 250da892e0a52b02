//! Connection handle
//!
//! The router's view of one WebSocket connection: an id plus the
//! outbound message channel drained by the connection's write task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Opaque send handle for a connected client
///
/// Cheap to clone; rooms store clones in their participant maps.
/// Two handles are equal when they refer to the same connection.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Server → Client message channel
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    /// Create a new connection handle with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Queue a message for this connection
    ///
    /// Never blocks. Returns an error if the channel is closed (client
    /// disconnected or its write task ended).
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.send(msg).map_err(|_| SendError::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
