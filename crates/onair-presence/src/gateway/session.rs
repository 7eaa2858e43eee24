//! Public handle for a gateway session.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::connection::SessionTask;
use super::transport::GatewayConnector;
use super::types::{GatewayError, SessionCommand, SessionConfig, SessionEvent, SessionStatus};
use crate::activity::Activity;

/// Handle to one gateway session.
///
/// All methods are non-blocking and send commands to the background
/// session task. A session is never reused: once destroyed, build a new one.
pub struct GatewaySession {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    task: Option<JoinHandle<()>>,
}

impl GatewaySession {
    /// Spawn the session task. Nothing connects until [`connect`] or
    /// [`ensure_connected`] is called.
    ///
    /// [`connect`]: Self::connect
    /// [`ensure_connected`]: Self::ensure_connected
    pub fn start(
        token: impl Into<String>,
        config: SessionConfig,
        connector: Arc<dyn GatewayConnector>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());

        let task = SessionTask::new(
            config,
            token.into(),
            connector,
            command_rx,
            event_tx,
            status_tx,
        );
        let handle = tokio::spawn(task.run());

        (
            Self {
                command_tx,
                status: status_rx,
                task: Some(handle),
            },
            event_rx,
        )
    }

    /// Request a ready connection without waiting for it.
    pub fn connect(&self) {
        let _ = self.command_tx.send(SessionCommand::Connect { reply: None });
    }

    /// Request a ready connection. The request is registered immediately;
    /// the returned future resolves once the session is ready.
    pub fn ensure_connected(&self) -> impl Future<Output = Result<(), GatewayError>> + Send + 'static {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.command_tx.send(SessionCommand::Connect {
            reply: Some(reply_tx),
        });
        async move { reply_rx.await.unwrap_or(Err(GatewayError::Destroyed)) }
    }

    /// Publish an activity, or clear it with `None`.
    pub fn publish(&self, activity: Option<Activity>) {
        let _ = self.command_tx.send(SessionCommand::Publish(activity));
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Watch the session state.
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Close the socket, cancel every timer and wait for the task to stop.
    pub async fn destroy(mut self) {
        let _ = self.command_tx.send(SessionCommand::Destroy);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for GatewaySession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
