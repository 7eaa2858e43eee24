//! Delegated authorization settings.

use serde::{Deserialize, Serialize};

/// OAuth2 endpoints and token lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub revoke_url: String,
    pub scopes: Vec<String>,
    /// Redirect URI registered for the application.
    pub redirect_uri: String,
    /// Refresh the token once it is this close to expiring (valid range: 0-86400).
    pub expiration_tolerance_secs: u64,
    /// Override for the token file; defaults to `<config dir>/onair/tokens.json`.
    pub token_file: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: "https://discord.com/oauth2/authorize".into(),
            token_url: "https://discord.com/api/oauth2/token".into(),
            revoke_url: "https://discord.com/api/oauth2/token/revoke".into(),
            scopes: vec!["identify".into(), "sdk.social_layer_presence".into()],
            redirect_uri: "http://127.0.0.1:7783/callback".into(),
            expiration_tolerance_secs: 60 * 60,
            token_file: None,
        }
    }
}
