//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol. Outbound messages use Serde's
//! tagged enum; inbound frames are read into a flat envelope first and then
//! checked field by field, so drawing payloads can be kept as raw JSON text.
//! Type tags and field names are camelCase on the wire (`createRoom`,
//! `userName`, ...).

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::AppError;
use crate::types::RoomId;

/// One opaque drawing event (a stroke segment, a shape, ...)
///
/// Stored as the exact JSON text the client sent, so number formatting,
/// key order and whitespace are relayed and replayed unchanged. Any JSON
/// value except `null` is accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DrawingData(Box<RawValue>);

impl DrawingData {
    pub fn from_raw(raw: Box<RawValue>) -> Result<Self, AppError> {
        if raw.get().trim() == "null" {
            return Err(AppError::InvalidMessage("drawingData is null".to_string()));
        }
        Ok(Self(raw))
    }

    /// The payload's JSON text, byte for byte as received
    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for DrawingData {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<Value> for DrawingData {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_raw(serde_json::value::to_raw_value(&value)?)
    }
}

/// Client → Server message
///
/// Every field is required; a missing one fails decoding and the
/// message is dropped by the connection handler.
#[derive(Debug)]
pub enum ClientMessage {
    /// Create a room, or reattach as its host
    CreateRoom { user_name: String, room_name: String },
    /// Join an existing room by id
    JoinRoom { room_id: RoomId, user_name: String },
    /// Persisted drawing event, replayed to later joiners
    Draw {
        room_id: RoomId,
        drawing_data: DrawingData,
    },
    /// Ephemeral drawing event (cursor, stroke preview), never replayed
    BroadcastDrawingData {
        room_id: RoomId,
        drawing_data: DrawingData,
    },
}

/// Inbound frame before dispatch on `type`
///
/// Unknown fields are ignored. `null` counts as missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    user_name: Option<String>,
    room_name: Option<String>,
    room_id: Option<RoomId>,
    drawing_data: Option<Box<RawValue>>,
}

fn required<T>(field: Option<T>, name: &str) -> Result<T, AppError> {
    field.ok_or_else(|| AppError::InvalidMessage(format!("missing {}", name)))
}

impl ClientMessage {
    /// Decode and validate a text frame
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let env: Envelope = serde_json::from_str(text)?;

        let msg = match env.kind.as_str() {
            "createRoom" => ClientMessage::CreateRoom {
                user_name: required(env.user_name, "userName")?,
                room_name: required(env.room_name, "roomName")?,
            },
            "joinRoom" => ClientMessage::JoinRoom {
                room_id: required(env.room_id, "roomId")?,
                user_name: required(env.user_name, "userName")?,
            },
            "draw" => ClientMessage::Draw {
                room_id: required(env.room_id, "roomId")?,
                drawing_data: DrawingData::from_raw(required(env.drawing_data, "drawingData")?)?,
            },
            "broadcastDrawingData" => ClientMessage::BroadcastDrawingData {
                room_id: required(env.room_id, "roomId")?,
                drawing_data: DrawingData::from_raw(required(env.drawing_data, "drawingData")?)?,
            },
            other => {
                return Err(AppError::InvalidMessage(format!("unknown type '{}'", other)));
            }
        };

        msg.validate()?;
        Ok(msg)
    }

    /// Reject values that decode but cannot be acted on
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            ClientMessage::CreateRoom { user_name, .. }
            | ClientMessage::JoinRoom { user_name, .. } => {
                if user_name.trim().is_empty() {
                    return Err(AppError::InvalidMessage("userName is blank".to_string()));
                }
            }
            ClientMessage::Draw { .. } | ClientMessage::BroadcastDrawingData { .. } => {}
        }
        Ok(())
    }
}

/// Outcome carried by `roomCreated` and `joinRoom` replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Server → Client message
///
/// Replies carry either the success fields or `message`, never both.
/// Use the constructors below rather than building variants by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to `createRoom`
    RoomCreated {
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Reply to `joinRoom`
    JoinRoom {
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        host_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        drawing_data: Option<Vec<DrawingData>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Relayed persisted drawing event
    Draw { drawing_data: DrawingData },
    /// Relayed ephemeral drawing event
    BroadcastDrawingData { drawing_data: DrawingData },
}

impl ServerMessage {
    pub fn room_created(room_id: RoomId) -> Self {
        ServerMessage::RoomCreated {
            status: Status::Success,
            room_id: Some(room_id),
            message: None,
        }
    }

    pub fn room_create_failed(err: &AppError) -> Self {
        ServerMessage::RoomCreated {
            status: Status::Error,
            room_id: None,
            message: Some(err.reply_message().to_string()),
        }
    }

    /// Successful join, with the room's whole drawing log for replay
    pub fn room_joined(room_name: String, host_name: String, drawing_data: Vec<DrawingData>) -> Self {
        ServerMessage::JoinRoom {
            status: Status::Success,
            room_name: Some(room_name),
            host_name: Some(host_name),
            drawing_data: Some(drawing_data),
            message: None,
        }
    }

    pub fn join_failed(err: &AppError) -> Self {
        ServerMessage::JoinRoom {
            status: Status::Error,
            room_name: None,
            host_name: None,
            drawing_data: None,
            message: Some(err.reply_message().to_string()),
        }
    }
}
