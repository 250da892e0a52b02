//! Collaborative Drawing Relay Library
//!
//! A WebSocket relay built with tokio-tungstenite that groups connections
//! into short-lived drawing rooms and relays drawing events between their
//! participants, using the Actor pattern for state management.
//!
//! # Features
//! - Room creation with random 6-digit ids
//! - Host reattach on reconnect under the same name
//! - Room joining with per-room unique display names
//! - Drawing event relay with a replay log for late joiners
//! - Ephemeral broadcasts (cursors, previews) that are never replayed
//! - Room cleanup when the last participant disconnects
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `DrawingServer` is the central actor owning the `RoomRegistry`
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use drawing_relay::{accept_loop, DrawingServer, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(DrawingServer::with_config(cmd_rx, RelayConfig::default()).run());
//!     accept_loop(listener, cmd_tx, "/drawing".to_string()).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Connection;
pub use config::{RelayConfig, ServerConfig};
pub use error::{AppError, SendError};
pub use handler::{accept_loop, handle_connection};
pub use message::{ClientMessage, DrawingData, ServerMessage, Status};
pub use registry::{Departure, Membership, RoomRegistry};
pub use room::Room;
pub use server::{DrawingServer, ServerCommand};
pub use types::{ClientId, RoomId};
