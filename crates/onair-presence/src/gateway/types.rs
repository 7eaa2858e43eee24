//! Configuration, errors, events and commands for the gateway session.

use std::time::Duration;

use onair_config::GatewayConfig;
use tokio::sync::oneshot;

use crate::activity::Activity;
use crate::protocol::{ConnectionProperties, DEFAULT_GATEWAY_URL};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// URL used when no resume URL has been captured.
    pub gateway_url: String,
    /// Delay between a cleared presence and closing the socket.
    pub disconnect_grace: Duration,
    /// Fixed backoff before reconnecting.
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub properties: ConnectionProperties,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            disconnect_grace: Duration::from_secs(20),
            reconnect_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(15),
            properties: ConnectionProperties::for_client(concat!(
                "onair/",
                env!("CARGO_PKG_VERSION")
            )),
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            gateway_url: config.url.clone(),
            disconnect_grace: Duration::from_millis(config.disconnect_grace_ms),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            properties: ConnectionProperties::for_client(&config.client_name),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to connect to gateway: {0}")]
    Connect(String),

    #[error("gateway connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("no access token; not connecting")]
    Unauthenticated,

    #[error("gateway closed the session (code {code:?})")]
    Terminated { code: Option<u16> },

    #[error("session disconnected before it became ready")]
    Disconnected,

    #[error("session destroyed")]
    Destroyed,
}

impl From<GatewayError> for onair_common::OnairError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// State & events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    Connecting,
    Identifying,
    Resuming,
    Ready,
}

/// Snapshot of the session state, refreshed after every step of the
/// session task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub session_id: String,
    pub resume_url: Option<String>,
    pub sequence: Option<u64>,
    pub reconnect_pending: bool,
}

impl SessionStatus {
    pub fn can_resume(&self) -> bool {
        !self.session_id.is_empty() && self.resume_url.is_some()
    }
}

/// Events emitted by the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A fresh IDENTIFY completed.
    Ready,
    /// A RESUME completed; earlier frames may have been lost.
    Resumed,
    /// The transport went away and a reconnect is scheduled.
    Reconnecting { code: Option<u16> },
    /// The gateway closed the session for good.
    Terminated { code: Option<u16> },
}

pub(crate) type ReadyReply = oneshot::Sender<Result<(), GatewayError>>;

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Connect { reply: Option<ReadyReply> },
    Publish(Option<Activity>),
    Destroy,
}
