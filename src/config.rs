//! Runtime configuration
//!
//! `ServerConfig` is the process-level configuration parsed from the command
//! line (with environment fallbacks). `RelayConfig` is the subset the router
//! needs, so the library can be driven without clap.

use clap::Parser;

use crate::registry::DEFAULT_MAX_ID_ATTEMPTS;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default WebSocket endpoint path
pub const DEFAULT_PATH: &str = "/drawing";

/// Default channel buffer size for router commands
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Room-relay server for collaborative drawing
#[derive(Parser, Debug, Clone)]
#[command(name = "drawing_relay")]
#[command(about = "Room-based collaborative drawing relay over WebSocket")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(env = "DRAWING_RELAY_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Request path the WebSocket endpoint is served on
    #[arg(long, env = "DRAWING_RELAY_PATH", default_value = DEFAULT_PATH)]
    pub path: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "drawing_relay=info")]
    pub log_level: String,

    /// Router command channel capacity
    #[arg(long, default_value_t = DEFAULT_CHANNEL_BUFFER, value_parser = parse_capacity)]
    pub channel_buffer: usize,

    /// Room id draws before room creation fails
    #[arg(long, default_value_t = DEFAULT_MAX_ID_ATTEMPTS)]
    pub max_id_attempts: usize,

    /// Skip a draw event identical to the previous one in the same room
    #[arg(long, env = "DRAWING_RELAY_DEDUPE_DRAWS")]
    pub dedupe_draws: bool,
}

/// Parse a count that must be at least one
fn parse_capacity(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl ServerConfig {
    pub fn relay(&self) -> RelayConfig {
        RelayConfig {
            max_id_attempts: self.max_id_attempts,
            dedupe_consecutive_draws: self.dedupe_draws,
        }
    }
}

/// Router tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Cap on room id draws per creation
    pub max_id_attempts: usize,
    /// Drop a draw event equal to the room's last logged event
    pub dedupe_consecutive_draws: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            dedupe_consecutive_draws: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["drawing_relay"]).unwrap();
        assert_eq!(config.path, DEFAULT_PATH);
        assert_eq!(config.channel_buffer, DEFAULT_CHANNEL_BUFFER);
        assert_eq!(config.relay(), RelayConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "drawing_relay",
            "0.0.0.0:9000",
            "--path",
            "/canvas",
            "--max-id-attempts",
            "10",
            "--dedupe-draws",
        ])
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:9000");
        assert_eq!(config.path, "/canvas");
        assert_eq!(
            config.relay(),
            RelayConfig {
                max_id_attempts: 10,
                dedupe_consecutive_draws: true,
            }
        );
    }

    #[test]
    fn test_zero_channel_buffer_rejected() {
        assert!(ServerConfig::try_parse_from(["drawing_relay", "--channel-buffer", "0"]).is_err());
        assert!(ServerConfig::try_parse_from(["drawing_relay", "--channel-buffer", "x"]).is_err());

        let config =
            ServerConfig::try_parse_from(["drawing_relay", "--channel-buffer", "1"]).unwrap();
        assert_eq!(config.channel_buffer, 1);
    }
}
