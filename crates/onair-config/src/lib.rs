//! onair configuration system.
//!
//! TOML-based configuration with full validation. All sections use
//! sensible defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    AuthConfig, ButtonConfig, DaemonConfig, GatewayConfig, LogLevel, LoggingConfig,
    ObserverConfig, OnairConfig, PresenceConfig, CONFIG_SCHEMA_VERSION,
};
pub use toml_loader::{config_dir, load_from_path};

use onair_common::ConfigError;
use std::path::Path;

/// Load and validate config, from `path` when given, else from the
/// platform default location (creating it if missing).
pub fn load_config(path: Option<&Path>) -> Result<OnairConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed TOML string.
pub fn config_to_toml(config: &OnairConfig) -> String {
    toml::to_string_pretty(config)
        .unwrap_or_else(|e| format!("# failed to serialize config: {e}\n"))
}
