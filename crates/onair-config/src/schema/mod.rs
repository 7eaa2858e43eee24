//! Configuration schema types for onair.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod auth;
mod gateway;
mod presence;
mod system;

pub use auth::*;
pub use gateway::*;
pub use presence::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OnairConfig {
    pub gateway: GatewayConfig,
    pub presence: PresenceConfig,
    pub observer: ObserverConfig,
    pub auth: AuthConfig,
    pub daemon: DaemonConfig,
    pub logging: LoggingConfig,
}
