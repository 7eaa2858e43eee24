//! Long-lived gateway session with identify/resume, heartbeats and
//! automatic reconnection.
//!
//! A [`GatewaySession`] is a handle to a background task that owns the
//! socket and every timer. Commands flow in over a channel and
//! [`SessionEvent`]s flow out, mirroring how the rest of the workspace
//! structures its long-running connections.

mod connection;
mod session;
mod transport;
mod types;

pub use session::GatewaySession;
pub use transport::{GatewayConnector, Outbound, SocketEvent, Transport, TungsteniteConnector};
pub use types::{GatewayError, SessionConfig, SessionEvent, SessionPhase, SessionStatus};
