//! Presence gateway connection settings.

use serde::{Deserialize, Serialize};

/// Gateway connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default gateway URL used when no resume URL has been captured.
    pub url: String,
    /// Grace period before a cleared presence tears the session down (valid range: 1000-300000).
    pub disconnect_grace_ms: u64,
    /// Fixed backoff before reconnecting after a reconnectable close (valid range: 100-60000).
    pub reconnect_delay_ms: u64,
    /// Timeout for opening the socket, in seconds (valid range: 1-120).
    pub connect_timeout_secs: u64,
    /// Value sent as the `browser` identify property.
    pub client_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "wss://gateway.discord.gg".into(),
            disconnect_grace_ms: 20_000,
            reconnect_delay_ms: 1_000,
            connect_timeout_secs: 15,
            client_name: concat!("onair/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}
