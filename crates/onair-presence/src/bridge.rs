//! Volume and transport relay between the host page and embedded player
//! frames.
//!
//! Messages carry an `ntsPlus: true` flag; anything else on the channel is
//! someone else's traffic and is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::observer::TransportEvent;

pub const FRAME_FLAG: &str = "ntsPlus";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameMessageKind {
    Volume { volume: f64 },
    VolumeRequest,
    Play,
    Pause,
}

/// A cross-frame message: `{"ntsPlus": true, "type": ..., "volume"?: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    #[serde(rename = "ntsPlus")]
    pub flag: bool,
    #[serde(flatten)]
    pub kind: FrameMessageKind,
}

impl FrameMessage {
    pub fn new(kind: FrameMessageKind) -> Self {
        Self { flag: true, kind }
    }

    pub fn volume(volume: f64) -> Self {
        Self::new(FrameMessageKind::Volume { volume })
    }

    /// Parse a posted value; `None` unless it is flagged as ours and
    /// well-formed.
    pub fn parse(value: &Value) -> Option<Self> {
        if value.get(FRAME_FLAG) != Some(&Value::Bool(true)) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn transport_event(&self) -> Option<TransportEvent> {
        match self.kind {
            FrameMessageKind::Play => Some(TransportEvent::Play),
            FrameMessageKind::Pause => Some(TransportEvent::Pause),
            _ => None,
        }
    }
}

/// Where a frame message can be posted. Returns `false` once the other
/// side is gone.
pub trait FramePort: Send {
    fn post(&self, message: &FrameMessage) -> bool;
}

impl FramePort for mpsc::UnboundedSender<FrameMessage> {
    fn post(&self, message: &FrameMessage) -> bool {
        self.send(message.clone()).is_ok()
    }
}

/// An audio element whose volume can be set directly.
pub trait AudioElement: Send {
    fn set_volume(&self, volume: f64);
}

fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

/// Keeps every embedded player at the host's main volume.
pub struct VolumeBridge {
    main_volume: f64,
    embedded_audio: Option<Box<dyn AudioElement>>,
    frames: HashMap<String, Box<dyn FramePort>>,
}

impl Default for VolumeBridge {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl VolumeBridge {
    pub fn new(main_volume: f64) -> Self {
        Self {
            main_volume: clamp_volume(main_volume),
            embedded_audio: None,
            frames: HashMap::new(),
        }
    }

    pub fn main_volume(&self) -> f64 {
        self.main_volume
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Attach the same-origin embedded audio element.
    pub fn set_embedded_audio(&mut self, audio: Option<Box<dyn AudioElement>>) {
        self.embedded_audio = audio;
    }

    pub fn register_frame(&mut self, id: impl Into<String>, port: Box<dyn FramePort>) {
        self.frames.insert(id.into(), port);
    }

    pub fn unregister_frame(&mut self, id: &str) {
        self.frames.remove(id);
    }

    /// The host's main volume changed.
    pub fn set_main_volume(&mut self, volume: f64) -> usize {
        self.main_volume = clamp_volume(volume);
        self.apply_main_volume()
    }

    /// The embedded player area was re-rendered; a new player may need the
    /// volume.
    pub fn embedded_player_changed(&mut self) -> usize {
        self.apply_main_volume()
    }

    /// Handle a message posted by a frame. Play/pause come back as
    /// transport events for the observer.
    pub fn handle_frame_message(&mut self, message: &FrameMessage) -> Option<TransportEvent> {
        match message.kind {
            FrameMessageKind::VolumeRequest => {
                self.apply_main_volume();
                None
            }
            FrameMessageKind::Play | FrameMessageKind::Pause => message.transport_event(),
            FrameMessageKind::Volume { .. } => {
                debug!("ignoring volume message sent to the host");
                None
            }
        }
    }

    /// Push the main volume everywhere. Returns how many frames got it;
    /// frames that are gone are forgotten.
    pub fn apply_main_volume(&mut self) -> usize {
        if let Some(audio) = &self.embedded_audio {
            audio.set_volume(self.main_volume);
        }

        let message = FrameMessage::volume(self.main_volume);
        self.frames.retain(|id, port| {
            let delivered = port.post(&message);
            if !delivered {
                debug!(frame = %id, "dropping closed frame");
            }
            delivered
        });
        self.frames.len()
    }
}

// ---------------------------------------------------------------------------
// Frame side
// ---------------------------------------------------------------------------

/// Runs inside an embedded player frame.
pub struct FrameRelay {
    parent: Box<dyn FramePort>,
    audio: Option<Box<dyn AudioElement>>,
    requested: bool,
}

impl FrameRelay {
    pub fn new(parent: Box<dyn FramePort>) -> Self {
        Self {
            parent,
            audio: None,
            requested: false,
        }
    }

    /// The frame's audio element showed up. The host is asked for the
    /// volume the first time only.
    pub fn audio_appeared(&mut self, audio: Box<dyn AudioElement>) {
        self.audio = Some(audio);
        if !self.requested {
            self.requested = true;
            self.parent
                .post(&FrameMessage::new(FrameMessageKind::VolumeRequest));
        }
    }

    /// Forward the frame's play/pause to the host.
    pub fn audio_event(&self, event: TransportEvent) {
        let kind = match event {
            TransportEvent::Play => FrameMessageKind::Play,
            TransportEvent::Pause => FrameMessageKind::Pause,
        };
        self.parent.post(&FrameMessage::new(kind));
    }

    /// Handle a message posted to the frame.
    pub fn handle_message(&self, value: &Value) {
        let Some(message) = FrameMessage::parse(value) else {
            return;
        };
        if let FrameMessageKind::Volume { volume } = message.kind {
            if let Some(audio) = &self.audio {
                audio.set_volume(clamp_volume(volume));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeAudio(Arc<Mutex<Option<f64>>>);

    impl FakeAudio {
        fn volume(&self) -> Option<f64> {
            *self.0.lock().unwrap()
        }
    }

    impl AudioElement for FakeAudio {
        fn set_volume(&self, volume: f64) {
            *self.0.lock().unwrap() = Some(volume);
        }
    }

    fn port() -> (Box<dyn FramePort>, mpsc::UnboundedReceiver<FrameMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(tx), rx)
    }

    #[test]
    fn wire_format() {
        assert_eq!(
            serde_json::to_value(FrameMessage::volume(0.5)).unwrap(),
            json!({"ntsPlus": true, "type": "volume", "volume": 0.5})
        );
        assert_eq!(
            serde_json::to_value(FrameMessage::new(FrameMessageKind::VolumeRequest)).unwrap(),
            json!({"ntsPlus": true, "type": "volume_request"})
        );
    }

    #[test]
    fn unflagged_messages_are_ignored() {
        assert!(FrameMessage::parse(&json!({"type": "play"})).is_none());
        assert!(FrameMessage::parse(&json!({"ntsPlus": "yes", "type": "play"})).is_none());
        assert!(FrameMessage::parse(&json!({"ntsPlus": true, "type": "rewind"})).is_none());
        assert!(FrameMessage::parse(&json!("play")).is_none());

        let play = FrameMessage::parse(&json!({"ntsPlus": true, "type": "play"})).unwrap();
        assert_eq!(play.transport_event(), Some(TransportEvent::Play));
    }

    #[test]
    fn volume_request_pushes_main_volume_everywhere() {
        let mut bridge = VolumeBridge::new(0.4);
        let audio = FakeAudio::default();
        bridge.set_embedded_audio(Some(Box::new(audio.clone())));
        let (first, mut first_rx) = port();
        let (second, mut second_rx) = port();
        bridge.register_frame("a", first);
        bridge.register_frame("b", second);

        let request = FrameMessage::new(FrameMessageKind::VolumeRequest);
        assert_eq!(bridge.handle_frame_message(&request), None);

        assert_eq!(audio.volume(), Some(0.4));
        assert_eq!(first_rx.try_recv().unwrap(), FrameMessage::volume(0.4));
        assert_eq!(second_rx.try_recv().unwrap(), FrameMessage::volume(0.4));
    }

    #[test]
    fn main_volume_changes_and_player_updates_propagate() {
        let mut bridge = VolumeBridge::default();
        let (frame, mut rx) = port();
        bridge.register_frame("a", frame);

        assert_eq!(bridge.set_main_volume(0.25), 1);
        assert_eq!(rx.try_recv().unwrap(), FrameMessage::volume(0.25));

        bridge.embedded_player_changed();
        assert_eq!(rx.try_recv().unwrap(), FrameMessage::volume(0.25));

        bridge.set_main_volume(3.0);
        assert_eq!(bridge.main_volume(), 1.0);
    }

    #[test]
    fn closed_frames_are_forgotten() {
        let mut bridge = VolumeBridge::default();
        let (frame, rx) = port();
        bridge.register_frame("a", frame);
        drop(rx);

        assert_eq!(bridge.apply_main_volume(), 0);
        assert_eq!(bridge.frame_count(), 0);
    }

    #[test]
    fn frame_play_pause_become_transport_events() {
        let mut bridge = VolumeBridge::default();
        let pause = FrameMessage::new(FrameMessageKind::Pause);
        assert_eq!(
            bridge.handle_frame_message(&pause),
            Some(TransportEvent::Pause)
        );
    }

    #[test]
    fn relay_requests_volume_once() {
        let (parent, mut rx) = port();
        let mut relay = FrameRelay::new(parent);

        relay.audio_appeared(Box::new(FakeAudio::default()));
        relay.audio_appeared(Box::new(FakeAudio::default()));

        assert_eq!(
            rx.try_recv().unwrap(),
            FrameMessage::new(FrameMessageKind::VolumeRequest)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn relay_forwards_transport_and_applies_volume() {
        let (parent, mut rx) = port();
        let mut relay = FrameRelay::new(parent);
        let audio = FakeAudio::default();

        // Volume before the audio element exists has nowhere to go.
        relay.handle_message(&json!({"ntsPlus": true, "type": "volume", "volume": 0.3}));
        assert_eq!(audio.volume(), None);

        relay.audio_appeared(Box::new(audio.clone()));
        rx.try_recv().unwrap();

        relay.audio_event(TransportEvent::Play);
        assert_eq!(rx.try_recv().unwrap().kind, FrameMessageKind::Play);

        relay.handle_message(&json!({"ntsPlus": true, "type": "volume", "volume": 0.3}));
        assert_eq!(audio.volume(), Some(0.3));

        relay.handle_message(&json!({"ntsPlus": true, "type": "volume", "volume": 1.7}));
        assert_eq!(audio.volume(), Some(1.0));

        relay.handle_message(&json!({"type": "volume", "volume": 0.1}));
        assert_eq!(audio.volume(), Some(1.0));
    }
}
