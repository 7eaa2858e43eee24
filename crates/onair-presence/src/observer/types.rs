//! Page snapshot and observation types.

use serde::{Deserialize, Serialize};

/// The playing live-channel indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveChannel {
    pub playing: bool,
    /// Set when the indicator carries the channel-2 marker.
    pub channel_two: bool,
    /// Broadcast heading text, if the indicator has one.
    pub heading: Option<String>,
}

/// The same-origin embedded archive player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedPlayer {
    pub hidden: bool,
    pub paused: bool,
}

/// What a content script saw on the page when it reported a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub live_channel: Option<LiveChannel>,
    pub embedded_player: Option<EmbeddedPlayer>,
    /// Heading of the currently expanded archive episode.
    pub expanded_episode_heading: Option<String>,
}

/// Play/pause forwarded from an embedded player frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportEvent {
    Play,
    Pause,
}

/// Input to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    Mutation(PageSnapshot),
    Transport(TransportEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector {
    Live(u8),
    Archive,
}

impl ChannelSelector {
    /// Label shown as the activity state.
    pub fn label(&self) -> String {
        match self {
            Self::Live(n) => format!("Channel {n}"),
            Self::Archive => "Archive".to_string(),
        }
    }
}

/// A settled reading of what is playing. `channel == None` means nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub show_name: Option<String>,
    pub channel: Option<ChannelSelector>,
}

impl Observation {
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.channel.is_some()
    }
}
