//! Publisher event loop.

use onair_common::Event;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::PresencePublisher;
use crate::observer::Observation;

impl PresencePublisher {
    /// Drive the publisher from settled observations and bus events until
    /// the observation source closes or a shutdown is announced.
    pub async fn run(
        mut self,
        mut observations: mpsc::Receiver<Observation>,
        mut events: broadcast::Receiver<Event>,
    ) {
        info!("presence publisher started");

        loop {
            tokio::select! {
                observation = observations.recv() => match observation {
                    Some(observation) => {
                        self.update_current_presence(&observation);
                    }
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(Event::TokenUpdated { access_token }) => {
                        self.update_access_token(access_token).await;
                    }
                    Ok(Event::Shutdown) => break,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "publisher lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(event) = self.next_session_event() => {
                    self.handle_session_event(event);
                }
            }
        }

        debug!("presence publisher stopping");
        self.shutdown().await;
    }
}
