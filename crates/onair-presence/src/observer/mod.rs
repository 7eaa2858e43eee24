//! Turns noisy page signals into settled "now playing" observations.

mod debounce;
mod evaluate;
mod types;

pub use debounce::PlaybackStateObserver;
pub use evaluate::evaluate;
pub use types::{
    ChannelSelector, EmbeddedPlayer, LiveChannel, Observation, PageSignal, PageSnapshot,
    TransportEvent,
};
