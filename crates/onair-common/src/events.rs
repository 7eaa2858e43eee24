use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// In-process broadcast events shared between the token broker, the
/// presence publisher and the daemon's context hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// The stored access token changed. An empty string means signed out.
    TokenUpdated { access_token: String },
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// A cheap handle that can publish onto the same bus.
    pub fn sender(&self) -> broadcast::Sender<Event> {
        self.sender.clone()
    }
}
