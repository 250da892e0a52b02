//! Error types for the drawing relay
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::RoomId;

/// Application-level errors
///
/// Transport errors end a connection. Protocol errors drop the offending
/// message. Not-found and conflict errors are turned into replies by the router.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Envelope decoded but failed field validation
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Room not found with the given id
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// Display name already used in the target room
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Connection is already a participant of a room
    #[error("Already in room {0}")]
    AlreadyInRoom(RoomId),

    /// Every drawn candidate collided with a live room
    #[error("No free room id after {0} attempts")]
    RoomIdsExhausted(usize),
}

impl AppError {
    /// Text sent back to the client in an error reply
    pub fn reply_message(&self) -> &'static str {
        match self {
            AppError::RoomNotFound(_) => "Room not found",
            AppError::UsernameTaken(_) => "Username already taken",
            AppError::AlreadyInRoom(_) => "Already in a room",
            AppError::RoomIdsExhausted(_) => "Could not allocate a room id",
            _ => "Internal error",
        }
    }
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
