//! Change-detected presence publishing over a replaceable gateway session.

mod run;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::activity::{presence_changed, Activity, ActivityTemplate};
use crate::gateway::{GatewayConnector, GatewaySession, SessionConfig, SessionEvent};
use crate::observer::Observation;

/// Owns at most one live [`GatewaySession`] and the last activity handed to
/// it.
///
/// The record of the last activity survives credential changes, so a new
/// session can republish it as soon as it is ready.
pub struct PresencePublisher {
    template: ActivityTemplate,
    config: SessionConfig,
    connector: Arc<dyn GatewayConnector>,
    token: String,
    session: Option<GatewaySession>,
    session_events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    last_published: Option<Activity>,
}

impl PresencePublisher {
    /// Build a publisher. A non-empty token starts an idle session right
    /// away; it connects on the first activity.
    pub fn new(
        token: impl Into<String>,
        template: ActivityTemplate,
        config: SessionConfig,
        connector: Arc<dyn GatewayConnector>,
    ) -> Self {
        let mut publisher = Self {
            template,
            config,
            connector,
            token: token.into(),
            session: None,
            session_events: None,
            last_published: None,
        };
        publisher.start_session();
        publisher
    }

    pub fn last_published(&self) -> Option<&Activity> {
        self.last_published.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&GatewaySession> {
        self.session.as_ref()
    }

    /// Publish what a settled observation says is playing.
    pub fn update_current_presence(&mut self, observation: &Observation) -> bool {
        let activity = self.template.activity_for(observation);
        self.publish_activity(activity)
    }

    /// Publish `next` unless it shows the same thing as the last activity.
    /// Returns whether anything changed.
    pub fn publish_activity(&mut self, next: Option<Activity>) -> bool {
        if !presence_changed(self.last_published.as_ref(), next.as_ref()) {
            debug!("presence unchanged; skipping update");
            return false;
        }
        self.last_published = next.clone();

        let Some(session) = &self.session else {
            debug!("no credentials; presence recorded but not published");
            return true;
        };
        match next {
            Some(activity) => {
                info!(details = ?activity.details, state = %activity.state, "publishing presence");
                session.connect();
                session.publish(Some(activity));
            }
            None => {
                info!("clearing presence");
                session.publish(None);
            }
        }
        true
    }

    /// Swap credentials. The current session is destroyed; a non-empty
    /// token gets a fresh session that reconnects when there is something
    /// to show.
    pub async fn update_access_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if token == self.token {
            return;
        }

        if let Some(session) = self.session.take() {
            debug!("destroying gateway session for old credentials");
            session.destroy().await;
        }
        self.session_events = None;
        self.token = token;

        if self.token.is_empty() {
            info!("signed out; presence publishing paused");
            return;
        }
        info!("credentials updated; starting new gateway session");
        self.start_session();
        if self.last_published.is_some() {
            if let Some(session) = &self.session {
                session.connect();
            }
        }
    }

    /// React to an event from the current session.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ready | SessionEvent::Resumed => {
                if event == SessionEvent::Resumed {
                    info!("gateway session resumed; republishing presence");
                }
                if let (Some(session), Some(activity)) = (&self.session, &self.last_published) {
                    session.publish(Some(activity.clone()));
                }
            }
            SessionEvent::Reconnecting { code } => {
                debug!(?code, "gateway session reconnecting");
            }
            SessionEvent::Terminated { code } => {
                warn!(?code, "gateway session ended; waiting for new credentials");
            }
        }
    }

    /// Next event from the current session; pending while there is none.
    pub async fn next_session_event(&mut self) -> Option<SessionEvent> {
        let event = match self.session_events.as_mut() {
            Some(events) => events.recv().await,
            None => std::future::pending().await,
        };
        if event.is_none() {
            self.session_events = None;
        }
        event
    }

    /// Destroy the current session.
    pub async fn shutdown(mut self) {
        if let Some(session) = self.session.take() {
            session.destroy().await;
        }
    }

    fn start_session(&mut self) {
        if self.token.is_empty() {
            return;
        }
        let (session, events) = GatewaySession::start(
            self.token.clone(),
            self.config.clone(),
            Arc::clone(&self.connector),
        );
        self.session = Some(session);
        self.session_events = Some(events);
    }
}
