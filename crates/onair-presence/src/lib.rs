//! Presence publishing core.
//!
//! Mirrors the radio player's "now playing" state into the presence
//! gateway. The gateway connection lives in [`gateway`], the playback
//! heuristics in [`observer`], change detection and credential rotation in
//! [`publisher`], and the cross-frame volume/transport relay in [`bridge`].

pub mod activity;
pub mod bridge;
pub mod gateway;
pub mod observer;
pub mod protocol;
pub mod publisher;

pub use activity::{presence_changed, Activity, ActivityKind, ActivityTemplate};
pub use bridge::{AudioElement, FrameMessage, FrameMessageKind, FramePort, FrameRelay, VolumeBridge};
pub use gateway::{
    GatewayConnector, GatewayError, GatewaySession, SessionConfig, SessionEvent, SessionPhase,
    SessionStatus, TungsteniteConnector,
};
pub use observer::{
    ChannelSelector, EmbeddedPlayer, LiveChannel, Observation, PageSignal, PageSnapshot,
    PlaybackStateObserver, TransportEvent,
};
pub use publisher::PresencePublisher;

#[cfg(test)]
pub(crate) mod testing;
