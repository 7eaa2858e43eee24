//! Debounced observer task.

use std::time::Duration;

use onair_config::ObserverConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::evaluate::evaluate;
use super::types::{Observation, PageSignal, PageSnapshot, TransportEvent};

/// Coalesces bursts of page signals into one evaluation, run once the page
/// has been quiet for the debounce period.
pub struct PlaybackStateObserver {
    debounce: Duration,
}

impl PlaybackStateObserver {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }

    pub fn from_config(config: &ObserverConfig) -> Self {
        Self::new(Duration::from_millis(config.debounce_ms))
    }

    pub fn spawn(
        self,
        signals: mpsc::Receiver<PageSignal>,
        observations: mpsc::Sender<Observation>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(signals, observations))
    }

    /// Run until the signal source closes. A burst still pending at that
    /// point is discarded.
    pub async fn run(
        self,
        mut signals: mpsc::Receiver<PageSignal>,
        observations: mpsc::Sender<Observation>,
    ) {
        let mut page = PageSnapshot::default();

        loop {
            // Wait for the first signal of a burst.
            let Some(signal) = signals.recv().await else {
                break;
            };
            let mut trigger = apply(&mut page, signal);

            // Every further signal pushes the evaluation back.
            let quiet = tokio::time::sleep(self.debounce);
            tokio::pin!(quiet);

            loop {
                tokio::select! {
                    () = &mut quiet => break,
                    signal = signals.recv() => match signal {
                        Some(signal) => {
                            trigger = apply(&mut page, signal);
                            quiet.as_mut().reset(Instant::now() + self.debounce);
                        }
                        None => return,
                    }
                }
            }

            let observation = evaluate(&page, trigger);
            debug!(?observation, "playback state settled");
            if observations.send(observation).await.is_err() {
                debug!("observation receiver dropped; observer stopping");
                break;
            }
        }
    }
}

/// Fold a signal into the page state; returns the transport event it
/// carried. The most recent signal decides the trigger.
fn apply(page: &mut PageSnapshot, signal: PageSignal) -> Option<TransportEvent> {
    match signal {
        PageSignal::Mutation(snapshot) => {
            *page = snapshot;
            None
        }
        PageSignal::Transport(event) => Some(event),
    }
}
