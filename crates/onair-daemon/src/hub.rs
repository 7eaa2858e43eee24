//! Registry of connected browser contexts and the routing between them,
//! the token broker, and the playback observer.

use std::collections::HashMap;
use std::sync::Arc;

use onair_auth::TokenBroker;
use onair_common::{ContextId, ContextRole, Event, ExtensionRequest};
use onair_presence::{AudioElement, FrameMessage, FramePort, PageSignal, VolumeBridge};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::{parse_inbound, DaemonMessage, Inbound, PageEvent};

struct ContextEntry {
    role: ContextRole,
    tx: mpsc::UnboundedSender<String>,
}

/// Posts cross-frame messages to a frame context's socket.
struct ContextSender(mpsc::UnboundedSender<String>);

impl FramePort for ContextSender {
    fn post(&self, message: &FrameMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => self.0.send(json).is_ok(),
            Err(e) => {
                warn!(error = %e, "failed to serialize frame message");
                true
            }
        }
    }
}

/// The host page's same-origin embedded audio, driven remotely.
struct HostAudio(mpsc::UnboundedSender<String>);

impl AudioElement for HostAudio {
    fn set_volume(&self, volume: f64) {
        let _ = self
            .0
            .send(DaemonMessage::EmbeddedVolume { volume }.to_json());
    }
}

pub struct ContextHub {
    contexts: RwLock<HashMap<ContextId, ContextEntry>>,
    bridge: Mutex<VolumeBridge>,
    signals: mpsc::Sender<PageSignal>,
    broker: Arc<TokenBroker>,
}

impl ContextHub {
    pub fn new(broker: Arc<TokenBroker>, signals: mpsc::Sender<PageSignal>) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            bridge: Mutex::new(VolumeBridge::default()),
            signals,
            broker,
        }
    }

    /// Register a context; frames join the volume bridge and a host page
    /// lends it its embedded audio.
    pub async fn register(
        &self,
        role: ContextRole,
        tx: mpsc::UnboundedSender<String>,
    ) -> ContextId {
        let id = ContextId::new();
        match role {
            ContextRole::Frame => {
                let mut bridge = self.bridge.lock().await;
                bridge.register_frame(id.to_string(), Box::new(ContextSender(tx.clone())));
            }
            ContextRole::Host => {
                let mut bridge = self.bridge.lock().await;
                bridge.set_embedded_audio(Some(Box::new(HostAudio(tx.clone()))));
            }
            ContextRole::Popup => {}
        }
        self.contexts
            .write()
            .await
            .insert(id.clone(), ContextEntry { role, tx });
        debug!(context = %id, ?role, "context registered");
        id
    }

    pub async fn unregister(&self, id: &ContextId) {
        let Some(entry) = self.contexts.write().await.remove(id) else {
            return;
        };
        let mut bridge = self.bridge.lock().await;
        match entry.role {
            ContextRole::Frame => bridge.unregister_frame(id.as_str()),
            ContextRole::Host => bridge.set_embedded_audio(None),
            ContextRole::Popup => {}
        }
        debug!(context = %id, role = ?entry.role, "context unregistered");
    }

    pub async fn count(&self) -> usize {
        self.contexts.read().await.len()
    }

    /// Handle one text message from a context. Returns the reply for that
    /// context, if any.
    pub async fn handle_text(
        &self,
        id: &ContextId,
        role: ContextRole,
        text: &str,
    ) -> Option<DaemonMessage> {
        let inbound = match parse_inbound(text) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(context = %id, error = %e, "malformed message");
                return Some(DaemonMessage::Error {
                    message: format!("malformed message: {e}"),
                });
            }
        };

        match inbound {
            Inbound::Frame(message) => {
                if role != ContextRole::Frame {
                    debug!(context = %id, ?role, "ignoring frame message from non-frame context");
                    return None;
                }
                let event = self.bridge.lock().await.handle_frame_message(&message);
                if let Some(event) = event {
                    self.signal(PageSignal::Transport(event)).await;
                }
                None
            }
            Inbound::Page(event) => {
                if role != ContextRole::Host {
                    debug!(context = %id, ?role, "ignoring page event from non-host context");
                    return None;
                }
                self.handle_page_event(event).await;
                None
            }
            Inbound::Request(envelope) => {
                if let ExtensionRequest::TokenUpdate { .. } = envelope.request {
                    // Another writer changed the stored credentials.
                    if let Err(e) = self.broker.reload_from_store().await {
                        warn!(error = %e, "failed to reload stored credentials");
                    }
                    return None;
                }
                let response = self.broker.handle_request(&envelope.request).await?;
                Some(DaemonMessage::Response {
                    id: envelope.id,
                    response,
                })
            }
            Inbound::Ignored => None,
        }
    }

    /// Send `TOKEN_UPDATE` to every context. Returns how many got it.
    pub async fn broadcast_token(&self, access_token: &str) -> usize {
        let json = DaemonMessage::TokenUpdate {
            access_token: access_token.to_string(),
        }
        .to_json();
        self.contexts
            .read()
            .await
            .values()
            .filter(|entry| entry.tx.send(json.clone()).is_ok())
            .count()
    }

    /// Fan token changes out to contexts until shutdown.
    pub async fn forward_token_updates(self: Arc<Self>, mut events: broadcast::Receiver<Event>) {
        loop {
            match events.recv().await {
                Ok(Event::TokenUpdated { access_token }) => {
                    let delivered = self.broadcast_token(&access_token).await;
                    info!(contexts = delivered, "token update broadcast");
                }
                Ok(Event::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "token fan-out lagged behind event bus");
                }
            }
        }
    }

    async fn handle_page_event(&self, event: PageEvent) {
        match event {
            PageEvent::Mutation { snapshot } => {
                self.signal(PageSignal::Mutation(snapshot)).await;
            }
            PageEvent::VolumeChange { volume } => {
                let frames = self.bridge.lock().await.set_main_volume(volume);
                debug!(volume, frames, "main volume changed");
            }
            PageEvent::PlayerMutation => {
                self.bridge.lock().await.embedded_player_changed();
            }
        }
    }

    async fn signal(&self, signal: PageSignal) {
        if self.signals.send(signal).await.is_err() {
            debug!("observer stopped; dropping page signal");
        }
    }
}
