//! Collaborative Drawing Relay - Entry Point
//!
//! Starts the TCP listener and DrawingServer actor, accepting connections.

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drawing_relay::{accept_loop, DrawingServer, RoomRegistry, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    // RUST_LOG wins over --log-level
    // e.g., RUST_LOG=debug or RUST_LOG=drawing_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let listener = TcpListener::bind(&config.addr).await?;
    info!(
        "Drawing relay listening on ws://{}{}",
        listener.local_addr()?,
        config.path
    );

    // Registry is built here and owned by the actor for the process lifetime
    let relay = config.relay();
    let registry = RoomRegistry::new(relay.max_id_attempts);
    let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_buffer);
    tokio::spawn(DrawingServer::new(cmd_rx, registry, relay).run());

    info!("DrawingServer actor started");

    accept_loop(listener, cmd_tx, config.path).await;

    Ok(())
}
