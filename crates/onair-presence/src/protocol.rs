//! Gateway wire protocol: frame envelope, opcodes, payload builders and
//! close-code classification.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::activity::Activity;

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Dispatch,
    Heartbeat,
    Identify,
    UpdatePresence,
    Resume,
    Reconnect,
    InvalidSession,
    Hello,
    Unknown(u8),
}

impl From<u8> for Opcode {
    fn from(op: u8) -> Self {
        match op {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::UpdatePresence,
            6 => Self::Resume,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            other => Self::Unknown(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        match op {
            Opcode::Dispatch => 0,
            Opcode::Heartbeat => 1,
            Opcode::Identify => 2,
            Opcode::UpdatePresence => 3,
            Opcode::Resume => 6,
            Opcode::Reconnect => 7,
            Opcode::InvalidSession => 9,
            Opcode::Hello => 10,
            Opcode::Unknown(other) => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame envelope
// ---------------------------------------------------------------------------

/// A gateway frame: `{op, d, s?, t?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

/// Client identification sent with IDENTIFY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl ConnectionProperties {
    pub fn for_client(client_name: &str) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: client_name.to_string(),
            device: "unknown".to_string(),
        }
    }
}

impl GatewayFrame {
    pub fn new(op: Opcode, d: Value) -> Self {
        Self {
            op: op.into(),
            d,
            s: None,
            t: None,
        }
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from(self.op)
    }

    pub fn identify(token: &str, properties: &ConnectionProperties) -> Self {
        Self::new(
            Opcode::Identify,
            json!({
                "token": bearer(token),
                "properties": properties,
            }),
        )
    }

    pub fn resume(token: &str, session_id: &str, seq: Option<u64>) -> Self {
        Self::new(
            Opcode::Resume,
            json!({
                "token": bearer(token),
                "session_id": session_id,
                "seq": seq,
            }),
        )
    }

    pub fn heartbeat(seq: Option<u64>) -> Self {
        Self::new(Opcode::Heartbeat, json!(seq))
    }

    /// Presence update; `None` clears every activity.
    pub fn update_presence(activity: Option<&Activity>) -> Self {
        let activities: Vec<&Activity> = activity.into_iter().collect();
        Self::new(
            Opcode::UpdatePresence,
            json!({
                "since": null,
                "activities": activities,
                "status": "online",
                "afk": false,
            }),
        )
    }

    /// `heartbeat_interval` from a HELLO payload, in milliseconds.
    pub fn heartbeat_interval_ms(&self) -> Option<u64> {
        self.d.get("heartbeat_interval").and_then(Value::as_u64)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// The part of a READY dispatch the session keeps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Close codes
// ---------------------------------------------------------------------------

pub const RECONNECTABLE_CLOSE_CODES: [u16; 8] = [4000, 4001, 4002, 4003, 4005, 4007, 4008, 4009];
pub const TERMINAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    Reconnect,
    Terminal,
}

/// Terminal codes end the session; anything else, including a missing
/// code, is retried.
pub fn classify_close(code: Option<u16>) -> CloseDisposition {
    match code {
        Some(code) if TERMINAL_CLOSE_CODES.contains(&code) => CloseDisposition::Terminal,
        _ => CloseDisposition::Reconnect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_parses_interval() {
        let frame: GatewayFrame =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        assert_eq!(frame.opcode(), Opcode::Hello);
        assert_eq!(frame.heartbeat_interval_ms(), Some(41_250));
        assert_eq!(frame.s, None);
    }

    #[test]
    fn dispatch_keeps_sequence_and_type() {
        let frame: GatewayFrame = serde_json::from_str(
            r#"{"op":0,"s":3,"t":"READY","d":{"session_id":"abc","resume_gateway_url":"wss://r"}}"#,
        )
        .unwrap();
        assert_eq!(frame.s, Some(3));
        assert_eq!(frame.t.as_deref(), Some("READY"));
        let ready: ReadyPayload = serde_json::from_value(frame.d).unwrap();
        assert_eq!(ready.session_id, "abc");
        assert_eq!(ready.resume_gateway_url.as_deref(), Some("wss://r"));
    }

    #[test]
    fn client_frames_omit_sequence_and_type() {
        let json = serde_json::to_value(GatewayFrame::heartbeat(None)).unwrap();
        assert_eq!(json, json!({"op": 1, "d": null}));
        let json = serde_json::to_value(GatewayFrame::heartbeat(Some(7))).unwrap();
        assert_eq!(json, json!({"op": 1, "d": 7}));
    }

    #[test]
    fn identify_and_resume_use_bearer_tokens() {
        let props = ConnectionProperties::for_client("onair/test");
        let identify = GatewayFrame::identify("tok", &props);
        assert_eq!(identify.op, 2);
        assert_eq!(identify.d["token"], "Bearer tok");
        assert_eq!(identify.d["properties"]["browser"], "onair/test");
        assert_eq!(identify.d["properties"]["device"], "unknown");

        let resume = GatewayFrame::resume("tok", "sess", Some(12));
        assert_eq!(resume.op, 6);
        assert_eq!(
            resume.d,
            json!({"token": "Bearer tok", "session_id": "sess", "seq": 12})
        );
    }

    #[test]
    fn cleared_presence_has_no_activities() {
        let frame = GatewayFrame::update_presence(None);
        assert_eq!(frame.op, 3);
        assert_eq!(
            frame.d,
            json!({"since": null, "activities": [], "status": "online", "afk": false})
        );
    }

    #[test]
    fn close_codes_classify() {
        for code in RECONNECTABLE_CLOSE_CODES {
            assert_eq!(classify_close(Some(code)), CloseDisposition::Reconnect);
        }
        for code in TERMINAL_CLOSE_CODES {
            assert_eq!(classify_close(Some(code)), CloseDisposition::Terminal);
        }
        assert_eq!(classify_close(Some(1006)), CloseDisposition::Reconnect);
        assert_eq!(classify_close(None), CloseDisposition::Reconnect);
    }

    #[test]
    fn opcode_round_trip_keeps_unknowns() {
        assert_eq!(Opcode::from(42), Opcode::Unknown(42));
        assert_eq!(u8::from(Opcode::Unknown(42)), 42);
        assert_eq!(u8::from(Opcode::from(9)), 9);
    }
}
