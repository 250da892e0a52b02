//! Room registry
//!
//! The authoritative room table plus two indices kept in step with it:
//! host name → rooms (for the host reattach lookup) and connection → its
//! current room membership (for cleanup on disconnect). Both avoid scanning
//! every room.
//!
//! The registry itself has no locking. It is owned by the router actor, which
//! applies every mutation from a single task, so each check-then-mutate
//! sequence below is atomic with respect to other connections.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::client::Connection;
use crate::error::AppError;
use crate::room::Room;
use crate::types::{ClientId, RoomId};

/// Default cap on id draws before `allocate_id` gives up
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 1000;

/// Where a connection currently participates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub name: String,
}

/// Result of a connection leaving its room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub name: String,
    pub host_name: String,
    /// Participants left behind; zero means the room was deleted
    pub remaining: usize,
}

impl Departure {
    pub fn room_closed(&self) -> bool {
        self.remaining == 0
    }
}

/// Table of live rooms
#[derive(Debug)]
pub struct RoomRegistry {
    /// All live rooms: RoomId -> Room
    rooms: HashMap<RoomId, Room>,
    /// Host name -> live rooms created under that name, oldest first
    hosted: HashMap<String, BTreeMap<u64, RoomId>>,
    /// Connection -> the room entry it currently owns
    members: HashMap<ClientId, Membership>,
    rng: StdRng,
    max_id_attempts: usize,
    /// Serial handed to the next inserted room
    next_serial: u64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ID_ATTEMPTS)
    }
}

impl RoomRegistry {
    /// Create an empty registry drawing ids from OS entropy
    pub fn new(max_id_attempts: usize) -> Self {
        Self::with_rng(StdRng::from_entropy(), max_id_attempts)
    }

    /// Create an empty registry with a deterministic id sequence
    pub fn with_seed(seed: u64, max_id_attempts: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), max_id_attempts)
    }

    fn with_rng(rng: StdRng, max_id_attempts: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            hosted: HashMap::new(),
            members: HashMap::new(),
            rng,
            max_id_attempts,
            next_serial: 0,
        }
    }

    /// Draw a room id not used by any live room
    pub fn allocate_id(&mut self) -> Result<RoomId, AppError> {
        for _ in 0..self.max_id_attempts {
            let candidate = RoomId::generate(&mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(AppError::RoomIdsExhausted(self.max_id_attempts))
    }

    /// Allocate an id and insert a room whose only participant is its host
    pub fn create_room(
        &mut self,
        room_name: String,
        host_name: String,
        host: Connection,
    ) -> Result<RoomId, AppError> {
        if let Some(m) = self.members.get(&host.id) {
            return Err(AppError::AlreadyInRoom(m.room_id.clone()));
        }
        let id = self.allocate_id()?;
        self.insert(Room::new(id.clone(), room_name, host_name, host));
        Ok(id)
    }

    /// Insert a room, replacing any live room with the same id
    pub fn insert(&mut self, mut room: Room) {
        let id = room.id.clone();
        self.remove(&id);

        room.serial = self.next_serial;
        self.next_serial += 1;
        self.hosted
            .entry(room.host_name.clone())
            .or_default()
            .insert(room.serial, id.clone());
        if let Some(conn) = room.participant(&room.host_name) {
            self.members.insert(
                conn.id,
                Membership {
                    room_id: id.clone(),
                    name: room.host_name.clone(),
                },
            );
        }
        self.rooms.insert(id, room);
    }

    /// Remove a room and drop every index entry pointing at it
    pub fn remove(&mut self, id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(id)?;

        if let Some(ids) = self.hosted.get_mut(&room.host_name) {
            ids.remove(&room.serial);
            if ids.is_empty() {
                self.hosted.remove(&room.host_name);
            }
        }
        self.members.retain(|_, m| &m.room_id != id);

        Some(room)
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Mutable access for drawing-log updates
    ///
    /// Participant changes must go through the registry so the indices stay
    /// consistent.
    pub fn get_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn membership(&self, client_id: ClientId) -> Option<&Membership> {
        self.members.get(&client_id)
    }

    /// Room a returning host should be reattached to
    ///
    /// A room qualifies when it was created under `user_name` and still lists
    /// `user_name` as a participant. The oldest room wins if several do.
    pub fn find_reattachable(&self, user_name: &str) -> Option<RoomId> {
        self.hosted.get(user_name)?.values().find_map(|id| {
            self.rooms
                .get(id)
                .filter(|room| room.has_participant(user_name))
                .map(|_| id.clone())
        })
    }

    /// Point the participant entry `name` of room `id` at a new connection
    ///
    /// Returns the id of the connection that previously owned the entry. That
    /// connection loses its membership, so closing it later has no effect on
    /// the room.
    pub fn reattach(
        &mut self,
        id: &RoomId,
        name: &str,
        conn: Connection,
    ) -> Result<ClientId, AppError> {
        if let Some(m) = self.members.get(&conn.id) {
            if &m.room_id != id || m.name != name {
                return Err(AppError::AlreadyInRoom(m.room_id.clone()));
            }
        }

        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| AppError::RoomNotFound(id.clone()))?;
        let new_id = conn.id;
        let previous = room
            .replace_connection(name, conn)
            .ok_or_else(|| AppError::RoomNotFound(id.clone()))?;

        if previous.id != new_id {
            self.members.remove(&previous.id);
        }
        self.members.insert(
            new_id,
            Membership {
                room_id: id.clone(),
                name: name.to_string(),
            },
        );
        Ok(previous.id)
    }

    /// Add a participant to an existing room
    ///
    /// Returns the new participant count.
    pub fn add_participant(
        &mut self,
        id: &RoomId,
        name: String,
        conn: Connection,
    ) -> Result<usize, AppError> {
        if let Some(m) = self.members.get(&conn.id) {
            return Err(AppError::AlreadyInRoom(m.room_id.clone()));
        }

        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| AppError::RoomNotFound(id.clone()))?;
        let client_id = conn.id;
        if !room.add_participant(name.clone(), conn) {
            return Err(AppError::UsernameTaken(name));
        }
        let count = room.participant_count();

        self.members.insert(
            client_id,
            Membership {
                room_id: id.clone(),
                name,
            },
        );
        Ok(count)
    }

    /// Remove participant `name` from room `id`
    ///
    /// Deletes the room when it becomes empty. Returns the number of
    /// participants remaining, or None if the room or name was not found.
    pub fn remove_participant(&mut self, id: &RoomId, name: &str) -> Option<usize> {
        let room = self.rooms.get_mut(id)?;
        let conn = room.remove_participant(name)?;
        let remaining = room.participant_count();

        if self
            .members
            .get(&conn.id)
            .is_some_and(|m| &m.room_id == id && m.name == name)
        {
            self.members.remove(&conn.id);
        }
        if remaining == 0 {
            self.remove(id);
        }
        Some(remaining)
    }

    /// Detach a closing connection from its room, if it has one
    pub fn leave(&mut self, client_id: ClientId) -> Option<Departure> {
        let Membership { room_id, name } = self.members.get(&client_id)?.clone();
        let host_name = self.rooms.get(&room_id)?.host_name.clone();
        let remaining = self.remove_participant(&room_id, &name)?;

        Some(Departure {
            room_id,
            name,
            host_name,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tokio::sync::mpsc;

    use super::*;

    fn conn() -> Connection {
        let (tx, _rx) = mpsc::unbounded_channel();
        Connection::new(ClientId::new(), tx)
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::with_seed(42, DEFAULT_MAX_ID_ATTEMPTS)
    }

    #[test]
    fn test_created_ids_unique_and_well_formed() {
        let mut reg = registry();
        let mut seen = HashSet::new();
        for i in 0..2000 {
            let id = reg
                .create_room("board".to_string(), format!("host{}", i), conn())
                .unwrap();
            assert!(id.is_well_formed());
            assert!(seen.insert(id));
        }
        assert_eq!(reg.len(), 2000);
    }

    #[test]
    fn test_allocate_skips_live_ids() {
        let mut reference = StdRng::seed_from_u64(9);
        let first = RoomId::generate(&mut reference);

        let mut reg = RoomRegistry::with_seed(9, 1);
        reg.insert(Room::new(
            first.clone(),
            "board".to_string(),
            "alice".to_string(),
            conn(),
        ));
        assert!(matches!(
            reg.allocate_id(),
            Err(AppError::RoomIdsExhausted(1))
        ));

        let mut reg = RoomRegistry::with_seed(9, 2);
        reg.insert(Room::new(
            first.clone(),
            "board".to_string(),
            "alice".to_string(),
            conn(),
        ));
        let id = reg.allocate_id().unwrap();
        assert_ne!(id, first);
    }

    #[test]
    fn test_join_then_leave_lifetime() {
        let mut reg = registry();
        let host = conn();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), host.clone())
            .unwrap();

        let guests: Vec<Connection> = (0..4).map(|_| conn()).collect();
        for (i, guest) in guests.iter().enumerate() {
            let count = reg
                .add_participant(&id, format!("guest{}", i), guest.clone())
                .unwrap();
            assert_eq!(count, i + 2);
        }

        // N joined, N-1 leave: one remains
        for guest in &guests {
            let departure = reg.leave(guest.id).unwrap();
            assert!(!departure.room_closed());
        }
        assert_eq!(reg.get(&id).unwrap().participant_count(), 1);

        let departure = reg.leave(host.id).unwrap();
        assert!(departure.room_closed());
        assert_eq!(departure.host_name, "alice");
        assert!(!reg.contains(&id));
        assert!(reg.is_empty());
        assert!(reg.find_reattachable("alice").is_none());
    }

    #[test]
    fn test_duplicate_name_leaves_room_untouched() {
        let mut reg = registry();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), conn())
            .unwrap();
        let bob = conn();
        reg.add_participant(&id, "bob".to_string(), bob.clone())
            .unwrap();

        let intruder = conn();
        let err = reg
            .add_participant(&id, "bob".to_string(), intruder.clone())
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken(_)));

        let room = reg.get(&id).unwrap();
        assert_eq!(room.participant_count(), 2);
        assert_eq!(room.participant("bob"), Some(&bob));
        assert!(reg.membership(intruder.id).is_none());
    }

    #[test]
    fn test_join_missing_room() {
        let mut reg = registry();
        let err = reg
            .add_participant(&RoomId::from_string("000000"), "bob".to_string(), conn())
            .unwrap_err();
        assert!(matches!(err, AppError::RoomNotFound(_)));
    }

    #[test]
    fn test_connection_in_one_room_only() {
        let mut reg = registry();
        let alice = conn();
        let first = reg
            .create_room("one".to_string(), "alice".to_string(), alice.clone())
            .unwrap();
        let second = reg
            .create_room("two".to_string(), "bob".to_string(), conn())
            .unwrap();

        assert!(matches!(
            reg.add_participant(&second, "alice".to_string(), alice.clone()),
            Err(AppError::AlreadyInRoom(_))
        ));
        assert!(matches!(
            reg.create_room("three".to_string(), "alice".to_string(), alice.clone()),
            Err(AppError::AlreadyInRoom(_))
        ));
        assert_eq!(reg.membership(alice.id).unwrap().room_id, first);
    }

    #[test]
    fn test_reattach_moves_membership() {
        let mut reg = registry();
        let old = conn();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), old.clone())
            .unwrap();
        assert_eq!(reg.find_reattachable("alice"), Some(id.clone()));

        let new = conn();
        let replaced = reg.reattach(&id, "alice", new.clone()).unwrap();
        assert_eq!(replaced, old.id);
        assert!(reg.membership(old.id).is_none());
        assert_eq!(reg.membership(new.id).unwrap().name, "alice");

        // The stale connection closing does not touch the room
        assert!(reg.leave(old.id).is_none());
        assert_eq!(reg.get(&id).unwrap().participant_count(), 1);
    }

    #[test]
    fn test_reattach_prefers_oldest_room() {
        let mut reg = registry();
        let older = RoomId::from_string("900000");
        let newer = RoomId::from_string("100000");
        reg.insert(Room::new(
            older.clone(),
            "first".to_string(),
            "alice".to_string(),
            conn(),
        ));
        reg.insert(Room::new(
            newer.clone(),
            "second".to_string(),
            "alice".to_string(),
            conn(),
        ));

        assert_eq!(reg.find_reattachable("alice"), Some(older.clone()));

        reg.remove(&older);
        assert_eq!(reg.find_reattachable("alice"), Some(newer));
    }

    #[test]
    fn test_host_gone_not_reattachable() {
        let mut reg = registry();
        let alice = conn();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), alice.clone())
            .unwrap();
        reg.add_participant(&id, "bob".to_string(), conn()).unwrap();

        reg.leave(alice.id).unwrap();
        assert!(reg.contains(&id));
        assert!(reg.find_reattachable("alice").is_none());
        assert!(reg.find_reattachable("bob").is_none());
    }

    #[test]
    fn test_remove_participant_returns_remaining() {
        let mut reg = registry();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), conn())
            .unwrap();
        let bob = conn();
        reg.add_participant(&id, "bob".to_string(), bob.clone())
            .unwrap();

        assert_eq!(reg.remove_participant(&id, "bob"), Some(1));
        assert!(reg.membership(bob.id).is_none());
        assert_eq!(reg.remove_participant(&id, "bob"), None);
        assert_eq!(reg.remove_participant(&id, "alice"), Some(0));
        assert!(!reg.contains(&id));
        assert_eq!(reg.remove_participant(&id, "alice"), None);
    }

    #[test]
    fn test_remove_room_clears_indices() {
        let mut reg = registry();
        let alice = conn();
        let id = reg
            .create_room("board".to_string(), "alice".to_string(), alice.clone())
            .unwrap();

        let room = reg.remove(&id).unwrap();
        assert_eq!(room.name, "board");
        assert!(reg.membership(alice.id).is_none());
        assert!(reg.find_reattachable("alice").is_none());
        assert!(reg.leave(alice.id).is_none());
    }
}
