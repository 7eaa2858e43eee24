//! In-memory gateway for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::activity::{Activity, ActivityTemplate};
use crate::gateway::{GatewayConnector, GatewayError, Outbound, SocketEvent, Transport};
use crate::observer::{ChannelSelector, Observation};

pub(crate) struct FakeSocket {
    pub(crate) url: String,
    pub(crate) from_client: mpsc::UnboundedReceiver<Outbound>,
    pub(crate) to_client: mpsc::UnboundedSender<SocketEvent>,
}

impl FakeSocket {
    pub(crate) fn send(&self, frame: Value) {
        self.to_client
            .send(SocketEvent::Message(frame.to_string()))
            .unwrap();
    }

    pub(crate) fn hello(&self) {
        self.send(json!({"op": 10, "d": {"heartbeat_interval": 41250}}));
    }

    pub(crate) fn ready(&self, seq: u64) {
        self.send(json!({
            "op": 0,
            "s": seq,
            "t": "READY",
            "d": {"session_id": "sess-1", "resume_gateway_url": "wss://resume.test"},
        }));
    }

    pub(crate) fn dispatch(&self, seq: u64, kind: &str) {
        self.send(json!({"op": 0, "s": seq, "t": kind, "d": {}}));
    }

    pub(crate) fn close(&self, code: u16) {
        self.to_client
            .send(SocketEvent::Closed { code: Some(code) })
            .unwrap();
    }

    /// Next frame the client sent, skipping heartbeats.
    pub(crate) async fn next_frame(&mut self) -> Value {
        loop {
            match self.from_client.recv().await {
                Some(Outbound::Text(text)) => {
                    let frame: Value = serde_json::from_str(&text).unwrap();
                    if frame["op"] != 1 {
                        return frame;
                    }
                }
                Some(Outbound::Close(code)) => panic!("unexpected close {code}"),
                None => panic!("client dropped the socket"),
            }
        }
    }

    pub(crate) async fn next_heartbeat(&mut self) -> Value {
        loop {
            match self.from_client.recv().await {
                Some(Outbound::Text(text)) => {
                    let frame: Value = serde_json::from_str(&text).unwrap();
                    if frame["op"] == 1 {
                        return frame;
                    }
                }
                other => panic!("expected a heartbeat, got {other:?}"),
            }
        }
    }

    /// Non-heartbeat frames already sent, without waiting.
    pub(crate) fn sent_frames(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(Outbound::Text(text)) = self.from_client.try_recv() {
            let frame: Value = serde_json::from_str(&text).unwrap();
            if frame["op"] != 1 {
                frames.push(frame);
            }
        }
        frames
    }

    /// Wait for a clean close and return its code.
    pub(crate) async fn expect_close(&mut self) -> u16 {
        loop {
            match self.from_client.recv().await {
                Some(Outbound::Text(_)) => continue,
                Some(Outbound::Close(code)) => return code,
                None => panic!("socket dropped without a close frame"),
            }
        }
    }

    /// Wait for the client to drop the socket without closing it.
    pub(crate) async fn expect_dropped(&mut self) {
        loop {
            match self.from_client.recv().await {
                Some(Outbound::Text(_)) => continue,
                Some(Outbound::Close(code)) => panic!("unexpected close {code}"),
                None => return,
            }
        }
    }
}

pub(crate) struct FakeConnector {
    connects: AtomicUsize,
    failures: AtomicUsize,
    sockets: mpsc::UnboundedSender<FakeSocket>,
}

impl FakeConnector {
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayConnector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Transport, GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GatewayError::Connect("connection refused".into()));
        }

        let (transport, from_client, to_client) = Transport::pair();
        let _ = self.sockets.send(FakeSocket {
            url: url.to_string(),
            from_client,
            to_client,
        });
        Ok(transport)
    }
}

/// A connector whose first `failures` attempts fail, plus the stream of
/// sockets it opens.
pub(crate) fn fake_connector(
    failures: usize,
) -> (Arc<FakeConnector>, mpsc::UnboundedReceiver<FakeSocket>) {
    let (socket_tx, sockets) = mpsc::unbounded_channel();
    let connector = Arc::new(FakeConnector {
        connects: AtomicUsize::new(0),
        failures: AtomicUsize::new(failures),
        sockets: socket_tx,
    });
    (connector, sockets)
}

pub(crate) fn template() -> ActivityTemplate {
    ActivityTemplate {
        name: "NTS Radio".into(),
        application_id: "1".into(),
        large_image: "2".into(),
        buttons: Vec::new(),
    }
}

pub(crate) fn live(show: &str, n: u8) -> Observation {
    Observation {
        show_name: Some(show.into()),
        channel: Some(ChannelSelector::Live(n)),
    }
}

pub(crate) fn activity(show: &str) -> Activity {
    template().activity_for(&live(show, 1)).unwrap()
}

/// Paused-clock timers fire on millisecond ticks.
pub(crate) fn assert_within(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}
