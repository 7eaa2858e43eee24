//! JSON messages exchanged with browser contexts over the local socket.

use onair_common::{ContextId, ContextRole, ExtensionRequest, ExtensionResponse};
use onair_presence::{FrameMessage, PageSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// First message every context must send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ContextHello {
    #[serde(rename = "HELLO")]
    Hello { role: ContextRole },
}

/// Page-side notifications from the host page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum PageEvent {
    /// The playback-relevant parts of the page changed.
    #[serde(rename = "PAGE_MUTATION")]
    Mutation { snapshot: PageSnapshot },

    /// The host's main volume slider moved.
    #[serde(rename = "VOLUME_CHANGE")]
    VolumeChange { volume: f64 },

    /// The embedded player area was re-rendered.
    #[serde(rename = "PLAYER_MUTATION")]
    PlayerMutation,
}

/// A request that may want a reply, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: ExtensionRequest,
}

/// Messages the daemon sends to contexts. Cross-frame messages are sent
/// in their own envelope instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DaemonMessage {
    #[serde(rename = "WELCOME")]
    Welcome { context_id: ContextId },

    #[serde(rename = "RESPONSE")]
    Response {
        id: Option<u64>,
        response: ExtensionResponse,
    },

    #[serde(rename = "TOKEN_UPDATE")]
    TokenUpdate {
        #[serde(rename = "accessToken")]
        access_token: String,
    },

    /// Set the host page's same-origin embedded audio element.
    #[serde(rename = "EMBEDDED_VOLUME")]
    EmbeddedVolume { volume: f64 },

    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl DaemonMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize daemon message");
            String::from(r#"{"type":"ERROR","message":"serialization failed"}"#)
        })
    }
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(FrameMessage),
    Page(PageEvent),
    Request(RequestEnvelope),
    /// Valid JSON that is not addressed to us.
    Ignored,
}

/// Classify one text message. Only malformed JSON is an error; unknown
/// message types are ignored.
pub fn parse_inbound(text: &str) -> Result<Inbound, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;

    if value.get(onair_presence::bridge::FRAME_FLAG).is_some() {
        return Ok(FrameMessage::parse(&value).map_or(Inbound::Ignored, Inbound::Frame));
    }
    if let Ok(event) = PageEvent::deserialize(&value) {
        return Ok(Inbound::Page(event));
    }
    if let Ok(envelope) = RequestEnvelope::deserialize(&value) {
        return Ok(Inbound::Request(envelope));
    }
    Ok(Inbound::Ignored)
}
