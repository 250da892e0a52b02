//! DrawingServer actor implementation
//!
//! The session router: a single actor that owns every connection handle and
//! the room registry. Connection handlers turn decoded client messages into
//! `ServerCommand`s; the actor applies them one at a time, so room state is
//! never mutated concurrently and each command sees a consistent registry.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::Connection;
use crate::config::RelayConfig;
use crate::message::{ClientMessage, DrawingData, ServerMessage};
use crate::registry::RoomRegistry;
use crate::room::Room;
use crate::types::{ClientId, RoomId};

/// Commands sent from handlers to the DrawingServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection opened
    Connect {
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    /// Connection closed
    Disconnect { client_id: ClientId },
    /// Create a room, or reattach as its host
    CreateRoom {
        client_id: ClientId,
        user_name: String,
        room_name: String,
    },
    /// Join an existing room
    JoinRoom {
        client_id: ClientId,
        room_id: RoomId,
        user_name: String,
    },
    /// Persisted drawing event
    Draw {
        client_id: ClientId,
        room_id: RoomId,
        drawing_data: DrawingData,
    },
    /// Ephemeral drawing event
    BroadcastDrawingData {
        client_id: ClientId,
        room_id: RoomId,
        drawing_data: DrawingData,
    },
}

impl ServerCommand {
    /// Wrap a decoded client message for the actor
    pub fn from_client(client_id: ClientId, msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::CreateRoom {
                user_name,
                room_name,
            } => ServerCommand::CreateRoom {
                client_id,
                user_name,
                room_name,
            },
            ClientMessage::JoinRoom { room_id, user_name } => ServerCommand::JoinRoom {
                client_id,
                room_id,
                user_name,
            },
            ClientMessage::Draw {
                room_id,
                drawing_data,
            } => ServerCommand::Draw {
                client_id,
                room_id,
                drawing_data,
            },
            ClientMessage::BroadcastDrawingData {
                room_id,
                drawing_data,
            } => ServerCommand::BroadcastDrawingData {
                client_id,
                room_id,
                drawing_data,
            },
        }
    }
}

/// The main DrawingServer actor
pub struct DrawingServer {
    /// All open connections: ClientId -> Connection
    clients: HashMap<ClientId, Connection>,
    /// Live rooms and their indices
    registry: RoomRegistry,
    config: RelayConfig,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl DrawingServer {
    /// Create a new DrawingServer around an explicitly constructed registry
    pub fn new(
        receiver: mpsc::Receiver<ServerCommand>,
        registry: RoomRegistry,
        config: RelayConfig,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            registry,
            config,
            receiver,
        }
    }

    /// Create a DrawingServer with a fresh registry built from `config`
    pub fn with_config(receiver: mpsc::Receiver<ServerCommand>, config: RelayConfig) -> Self {
        let registry = RoomRegistry::new(config.max_id_attempts);
        Self::new(receiver, registry, config)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Run the DrawingServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("DrawingServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("DrawingServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            ServerCommand::CreateRoom {
                client_id,
                user_name,
                room_name,
            } => {
                self.handle_create_room(client_id, user_name, room_name);
            }
            ServerCommand::JoinRoom {
                client_id,
                room_id,
                user_name,
            } => {
                self.handle_join_room(client_id, room_id, user_name);
            }
            ServerCommand::Draw {
                client_id,
                room_id,
                drawing_data,
            } => {
                self.handle_draw(client_id, room_id, drawing_data);
            }
            ServerCommand::BroadcastDrawingData {
                client_id,
                room_id,
                drawing_data,
            } => {
                self.handle_broadcast(client_id, room_id, drawing_data);
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<ServerMessage>) {
        debug!("Client {} registered", client_id);
        self.clients
            .insert(client_id, Connection::new(client_id, sender));
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle connection close
    ///
    /// A connection that never joined, or whose entry was taken over by a
    /// reattaching host, leaves every room untouched.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        self.clients.remove(&client_id);

        if let Some(departure) = self.registry.leave(client_id) {
            if departure.room_closed() {
                info!(
                    "Room {} deleted, all users disconnected",
                    departure.room_id
                );
            } else {
                info!(
                    "User {} left room {}. Host: {}, users: {}",
                    departure.name, departure.room_id, departure.host_name, departure.remaining
                );
            }
        }

        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle room creation
    fn handle_create_room(&mut self, client_id: ClientId, user_name: String, room_name: String) {
        let Some(conn) = self.clients.get(&client_id).cloned() else {
            return;
        };

        // A host coming back under the same name takes over its entry
        if let Some(room_id) = self.registry.find_reattachable(&user_name) {
            match self.registry.reattach(&room_id, &user_name, conn.clone()) {
                Ok(previous) => {
                    info!(
                        "Host {} reattached to room {} (connection {} -> {})",
                        user_name, room_id, previous, client_id
                    );
                    reply(&conn, ServerMessage::room_created(room_id));
                }
                Err(e) => {
                    debug!("Reattach refused for {}: {}", client_id, e);
                    reply(&conn, ServerMessage::room_create_failed(&e));
                }
            }
            return;
        }

        match self
            .registry
            .create_room(room_name.clone(), user_name.clone(), conn.clone())
        {
            Ok(room_id) => {
                info!(
                    "User {} created room {} named '{}'. Host: {}, users: 1",
                    user_name, room_id, room_name, user_name
                );
                reply(&conn, ServerMessage::room_created(room_id));
            }
            Err(e) => {
                warn!("Room creation failed for {}: {}", client_id, e);
                reply(&conn, ServerMessage::room_create_failed(&e));
            }
        }
    }

    /// Handle room joining
    fn handle_join_room(&mut self, client_id: ClientId, room_id: RoomId, user_name: String) {
        let Some(conn) = self.clients.get(&client_id).cloned() else {
            return;
        };

        let count = match self
            .registry
            .add_participant(&room_id, user_name.clone(), conn.clone())
        {
            Ok(count) => count,
            Err(e) => {
                debug!("Join refused for {}: {}", client_id, e);
                reply(&conn, ServerMessage::join_failed(&e));
                return;
            }
        };

        let Some(room) = self.registry.get(&room_id) else {
            return;
        };

        info!(
            "User {} joined room {}. Host: {}, users: {}",
            user_name, room_id, room.host_name, count
        );

        reply(
            &conn,
            ServerMessage::room_joined(
                room.name.clone(),
                room.host_name.clone(),
                room.drawing_log().to_vec(),
            ),
        );
    }

    /// Handle persisted drawing event: log it, then relay to everyone else
    fn handle_draw(&mut self, client_id: ClientId, room_id: RoomId, drawing_data: DrawingData) {
        let skip_duplicate = self.config.dedupe_consecutive_draws;
        let Some(room) = self.registry.get_mut(&room_id) else {
            debug!("Draw from {} for unknown room {} dropped", client_id, room_id);
            return;
        };

        if !room.record_drawing(drawing_data.clone(), skip_duplicate) {
            debug!("Duplicate draw from {} in room {} skipped", client_id, room_id);
            return;
        }

        let delivered = fan_out(room, client_id, ServerMessage::Draw { drawing_data });
        debug!("Draw in room {} relayed to {} participants", room_id, delivered);
    }

    /// Handle ephemeral drawing event: relay only, nothing is logged
    fn handle_broadcast(&mut self, client_id: ClientId, room_id: RoomId, drawing_data: DrawingData) {
        let Some(room) = self.registry.get(&room_id) else {
            debug!(
                "Broadcast from {} for unknown room {} dropped",
                client_id, room_id
            );
            return;
        };

        let delivered = fan_out(room, client_id, ServerMessage::BroadcastDrawingData { drawing_data });
        debug!("Broadcast in room {} relayed to {} participants", room_id, delivered);
    }
}

/// Send a reply, ignoring a connection that is already gone
fn reply(conn: &Connection, msg: ServerMessage) {
    if let Err(e) = conn.send(msg) {
        debug!("Reply to {} not delivered: {}", conn.id, e);
    }
}

/// Send `msg` to every participant of `room` except `sender`
///
/// A failed send is logged and skipped; the participant stays in the room
/// until its own close event arrives. Returns the number of deliveries.
fn fan_out(room: &Room, sender: ClientId, msg: ServerMessage) -> usize {
    let mut delivered = 0;
    for conn in room.others(sender) {
        match conn.send(msg.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Send to {} in room {} failed: {}", conn.id, room.id, e),
        }
    }
    delivered
}
