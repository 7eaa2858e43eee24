//! Inter-context messages exchanged between browser contexts and the
//! token-owning side. Requests are tagged by `type`; `TOKEN_UPDATE` is a
//! broadcast and never gets a response.

use serde::{Deserialize, Serialize};

/// Which kind of browser context is on the other end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextRole {
    /// The top-level radio page.
    Host,
    /// An embedded third-party player frame.
    Frame,
    /// The extension popup.
    Popup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtensionRequest {
    #[serde(rename = "GET_TOKEN")]
    GetToken,

    #[serde(rename = "LAUNCH_AUTHORIZATION")]
    LaunchAuthorization,

    #[serde(rename = "REVOKE_TOKENS")]
    RevokeTokens,

    #[serde(rename = "TOKEN_UPDATE")]
    TokenUpdate {
        #[serde(rename = "accessToken")]
        access_token: String,
    },
}

impl ExtensionRequest {
    /// Broadcasts carry no reply.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Self::TokenUpdate { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionResponse {
    Token {
        #[serde(rename = "accessToken")]
        access_token: String,
    },
    Error {
        error: String,
    },
    Ack(bool),
}
