//! Room struct definition
//!
//! A drawing room: its participants and the log replayed to late joiners.

use std::collections::HashMap;

use crate::client::Connection;
use crate::message::DrawingData;
use crate::types::{ClientId, RoomId};

/// Collaborative drawing room
///
/// Participants are keyed by display name, unique within the room. The host
/// name is informational only; the host has no extra permissions.
#[derive(Debug)]
pub struct Room {
    /// Room id for identification
    pub id: RoomId,
    /// Display label chosen by the creator
    pub name: String,
    /// Display name of the creator
    pub host_name: String,
    /// Display name -> connection
    participants: HashMap<String, Connection>,
    /// Append-only log of persisted drawing events
    drawing_log: Vec<DrawingData>,
    /// Insertion order assigned by the registry; lower is older
    pub(crate) serial: u64,
}

impl Room {
    /// Create a new room with the host as its only participant
    pub fn new(id: RoomId, name: String, host_name: String, host: Connection) -> Self {
        let mut participants = HashMap::new();
        participants.insert(host_name.clone(), host);
        Self {
            id,
            name,
            host_name,
            participants,
            drawing_log: Vec::new(),
            serial: 0,
        }
    }

    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    pub fn participant(&self, name: &str) -> Option<&Connection> {
        self.participants.get(name)
    }

    /// Add a participant
    ///
    /// Returns false if the name is already taken in this room.
    pub fn add_participant(&mut self, name: String, conn: Connection) -> bool {
        if self.participants.contains_key(&name) {
            return false;
        }
        self.participants.insert(name, conn);
        true
    }

    /// Point an existing participant entry at a different connection
    ///
    /// Returns the connection it replaced, or None if the name is not present.
    pub fn replace_connection(&mut self, name: &str, conn: Connection) -> Option<Connection> {
        self.participants
            .get_mut(name)
            .map(|slot| std::mem::replace(slot, conn))
    }

    /// Remove a participant by name
    pub fn remove_participant(&mut self, name: &str) -> Option<Connection> {
        self.participants.remove(name)
    }

    /// Name under which a connection participates, if any
    pub fn name_of(&self, client_id: ClientId) -> Option<&str> {
        self.participants
            .iter()
            .find(|(_, conn)| conn.id == client_id)
            .map(|(name, _)| name.as_str())
    }

    /// Every participant connection except the given one
    pub fn others(&self, client_id: ClientId) -> impl Iterator<Item = &Connection> {
        self.participants
            .values()
            .filter(move |conn| conn.id != client_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Append a drawing event to the replay log
    ///
    /// With `skip_duplicate` set, an event identical to the last logged one is
    /// not appended again. Returns whether the event was appended.
    pub fn record_drawing(&mut self, data: DrawingData, skip_duplicate: bool) -> bool {
        if skip_duplicate && self.drawing_log.last() == Some(&data) {
            return false;
        }
        self.drawing_log.push(data);
        true
    }

    /// Logged drawing events, oldest first
    pub fn drawing_log(&self) -> &[DrawingData] {
        &self.drawing_log
    }
}
