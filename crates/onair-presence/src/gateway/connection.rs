//! Background task that owns the gateway socket and every session timer.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::transport::{GatewayConnector, Outbound, SocketEvent, Transport};
use super::types::{
    GatewayError, ReadyReply, SessionCommand, SessionConfig, SessionEvent, SessionPhase,
    SessionStatus,
};
use crate::activity::Activity;
use crate::protocol::{classify_close, CloseDisposition, GatewayFrame, Opcode, ReadyPayload};

/// Close code sent when we end the session ourselves.
const NORMAL_CLOSURE: u16 = 1000;

type ConnectFuture = BoxFuture<'static, Result<Transport, GatewayError>>;

pub(crate) struct SessionTask {
    config: SessionConfig,
    token: String,
    connector: Arc<dyn GatewayConnector>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Sender<SessionStatus>,

    transport: Option<Transport>,
    connecting: Option<ConnectFuture>,
    phase: SessionPhase,
    resume_url: Option<String>,
    session_id: String,
    sequence: Option<u64>,
    heartbeat_interval: Option<Duration>,
    /// IDENTIFY already sent on the current transport.
    identified: bool,
    wants_reconnect: bool,
    /// Presence was cleared while no connection was ready.
    clear_pending: bool,
    waiters: Vec<ReadyReply>,

    heartbeat_at: Option<Instant>,
    reconnect_at: Option<Instant>,
    disconnect_at: Option<Instant>,
}

impl SessionTask {
    pub(crate) fn new(
        config: SessionConfig,
        token: String,
        connector: Arc<dyn GatewayConnector>,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
        status: watch::Sender<SessionStatus>,
    ) -> Self {
        Self {
            config,
            token,
            connector,
            commands,
            events,
            status,
            transport: None,
            connecting: None,
            phase: SessionPhase::Disconnected,
            resume_url: None,
            session_id: String::new(),
            sequence: None,
            heartbeat_interval: None,
            identified: false,
            wants_reconnect: false,
            clear_pending: false,
            waiters: Vec::new(),
            heartbeat_at: None,
            reconnect_at: None,
            disconnect_at: None,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Destroy) | None => break,
                    Some(command) => self.handle_command(command),
                },
                result = wait_connect(&mut self.connecting) => {
                    self.connecting = None;
                    self.on_connect_result(result);
                }
                event = next_socket_event(&mut self.transport) => self.on_socket_event(event),
                () = sleep_until(self.heartbeat_at) => self.send_heartbeat(),
                () = sleep_until(self.reconnect_at) => {
                    self.reconnect_at = None;
                    self.open(self.reconnect_url());
                }
                () = sleep_until(self.disconnect_at) => self.scheduled_disconnect(),
            }
            self.publish_status();
        }

        debug!("gateway session destroyed");
        self.close_transport(NORMAL_CLOSURE);
        self.fail_waiters(GatewayError::Destroyed);
        self.phase = SessionPhase::Disconnected;
        self.publish_status();
    }

    // -- commands ----------------------------------------------------------

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect { reply } => self.ensure_connected(reply),
            SessionCommand::Publish(activity) => self.publish(activity),
            SessionCommand::Destroy => {}
        }
    }

    fn ensure_connected(&mut self, reply: Option<ReadyReply>) {
        if self.phase == SessionPhase::Ready {
            if let Some(reply) = reply {
                let _ = reply.send(Ok(()));
            }
            return;
        }
        if self.token.is_empty() {
            if let Some(reply) = reply {
                let _ = reply.send(Err(GatewayError::Unauthenticated));
            }
            return;
        }

        self.waiters.extend(reply);
        self.wants_reconnect = true;

        // An attempt is already in flight; its outcome resolves every waiter.
        if self.transport.is_some() || self.connecting.is_some() || self.reconnect_at.is_some() {
            return;
        }
        self.open(self.reconnect_url());
    }

    fn publish(&mut self, activity: Option<Activity>) {
        match activity {
            None => {
                debug!(grace = ?self.config.disconnect_grace, "presence cleared; disconnect scheduled");
                self.disconnect_at = Some(Instant::now() + self.config.disconnect_grace);
            }
            Some(_) => {
                if self.disconnect_at.take().is_some() {
                    debug!("scheduled disconnect cancelled");
                }
            }
        }

        if self.phase != SessionPhase::Ready {
            debug!(phase = ?self.phase, "no ready connection; presence update dropped");
            self.clear_pending = activity.is_none();
            return;
        }
        self.clear_pending = false;
        self.send(&GatewayFrame::update_presence(activity.as_ref()));
    }

    // -- connection lifecycle ----------------------------------------------

    fn reconnect_url(&self) -> String {
        self.resume_url
            .clone()
            .unwrap_or_else(|| self.config.gateway_url.clone())
    }

    fn open(&mut self, url: String) {
        info!(url = %url, "connecting to gateway");
        self.phase = SessionPhase::Connecting;
        self.identified = false;

        let connector = Arc::clone(&self.connector);
        let timeout = self.config.connect_timeout;
        self.connecting = Some(Box::pin(async move {
            match tokio::time::timeout(timeout, connector.connect(&url)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(GatewayError::ConnectTimeout(timeout)),
            }
        }));
    }

    fn on_connect_result(&mut self, result: Result<Transport, GatewayError>) {
        match result {
            Ok(transport) => {
                debug!("gateway socket open; waiting for HELLO");
                self.transport = Some(transport);
            }
            Err(e) => {
                warn!(error = %e, "gateway connection failed");
                self.phase = SessionPhase::Disconnected;
                if self.wants_reconnect {
                    self.schedule_reconnect(None);
                }
            }
        }
    }

    fn on_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Message(text) => match serde_json::from_str::<GatewayFrame>(&text) {
                Ok(frame) => self.handle_frame(frame),
                Err(e) => warn!(error = %e, "dropping malformed gateway frame"),
            },
            SocketEvent::Closed { code } => self.on_close(code),
        }
    }

    fn on_close(&mut self, code: Option<u16>) {
        self.drop_transport();

        match classify_close(code) {
            CloseDisposition::Terminal => {
                warn!(?code, "gateway ended the session; not reconnecting");
                self.wants_reconnect = false;
                self.reconnect_at = None;
                self.clear_session();
                self.fail_waiters(GatewayError::Terminated { code });
                let _ = self.events.send(SessionEvent::Terminated { code });
            }
            CloseDisposition::Reconnect if self.wants_reconnect => {
                info!(?code, "gateway connection closed; reconnecting");
                self.schedule_reconnect(code);
            }
            CloseDisposition::Reconnect => {
                debug!(?code, "gateway connection closed");
            }
        }
    }

    fn schedule_reconnect(&mut self, code: Option<u16>) {
        self.reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
        let _ = self.events.send(SessionEvent::Reconnecting { code });
    }

    fn scheduled_disconnect(&mut self) {
        info!("presence cleared for the grace period; closing gateway session");
        self.disconnect_at = None;
        self.wants_reconnect = false;
        self.reconnect_at = None;
        self.clear_pending = false;
        self.close_transport(NORMAL_CLOSURE);
        self.clear_session();
        self.fail_waiters(GatewayError::Disconnected);
    }

    fn drop_transport(&mut self) {
        self.transport = None;
        self.connecting = None;
        self.heartbeat_at = None;
        self.identified = false;
        self.phase = SessionPhase::Disconnected;
    }

    fn close_transport(&mut self, code: u16) {
        if let Some(transport) = &self.transport {
            let _ = transport.outgoing.send(Outbound::Close(code));
        }
        self.drop_transport();
    }

    fn clear_session(&mut self) {
        self.session_id.clear();
        self.resume_url = None;
        self.sequence = None;
    }

    // -- frames ------------------------------------------------------------

    fn handle_frame(&mut self, frame: GatewayFrame) {
        match frame.opcode() {
            Opcode::Hello => self.on_hello(&frame),
            Opcode::Dispatch => {
                if let Some(seq) = frame.s {
                    self.sequence = Some(seq);
                }
                match frame.t.as_deref() {
                    Some("READY") => self.on_ready(frame.d),
                    Some("RESUMED") => self.on_resumed(),
                    _ => {}
                }
            }
            Opcode::Heartbeat => self.send_heartbeat(),
            Opcode::Reconnect => {
                info!("gateway requested a reconnect");
                self.drop_transport();
                self.schedule_reconnect(None);
            }
            Opcode::InvalidSession => self.on_invalid_session(frame.d.as_bool() == Some(true)),
            other => debug!(op = ?other, "ignoring gateway frame"),
        }
    }

    fn on_hello(&mut self, frame: &GatewayFrame) {
        let Some(interval_ms) = frame.heartbeat_interval_ms() else {
            warn!("HELLO without a heartbeat interval");
            return;
        };
        let interval = Duration::from_millis(interval_ms);
        self.heartbeat_interval = Some(interval);

        if !self.session_id.is_empty() && self.resume_url.is_some() {
            debug!(session_id = %self.session_id, seq = ?self.sequence, "resuming gateway session");
            self.phase = SessionPhase::Resuming;
            let resume = GatewayFrame::resume(&self.token, &self.session_id, self.sequence);
            self.send(&resume);
        } else if !self.identified {
            debug!("identifying with gateway");
            self.phase = SessionPhase::Identifying;
            self.identified = true;
            let identify = GatewayFrame::identify(&self.token, &self.config.properties);
            self.send(&identify);
        }

        // First beat is jittered across the interval.
        let jitter = interval.mul_f64(rand::random::<f64>());
        self.heartbeat_at = Some(Instant::now() + jitter);
    }

    fn on_ready(&mut self, d: serde_json::Value) {
        match serde_json::from_value::<ReadyPayload>(d) {
            Ok(ready) => {
                self.session_id = ready.session_id;
                self.resume_url = ready.resume_gateway_url;
            }
            Err(e) => warn!(error = %e, "READY without session details; resume disabled"),
        }
        info!("gateway session ready");
        self.go_ready();
        let _ = self.events.send(SessionEvent::Ready);
    }

    fn on_resumed(&mut self) {
        info!("gateway session resumed");
        self.go_ready();
        let _ = self.events.send(SessionEvent::Resumed);
    }

    fn go_ready(&mut self) {
        self.phase = SessionPhase::Ready;
        if std::mem::take(&mut self.clear_pending) {
            debug!("sending presence clear held while disconnected");
            self.send(&GatewayFrame::update_presence(None));
        }
        self.resolve_waiters();
    }

    /// The gateway rejected our IDENTIFY or RESUME. A resumable session is
    /// resumed again; otherwise the old session is forgotten and we identify
    /// on the same socket.
    fn on_invalid_session(&mut self, resumable: bool) {
        if self.transport.is_none() {
            return;
        }
        if resumable && !self.session_id.is_empty() {
            warn!("gateway reported an invalid session; retrying resume");
            self.phase = SessionPhase::Resuming;
            let resume = GatewayFrame::resume(&self.token, &self.session_id, self.sequence);
            self.send(&resume);
            return;
        }

        warn!("gateway session is not resumable; identifying again");
        self.clear_session();
        self.phase = SessionPhase::Identifying;
        self.identified = true;
        let identify = GatewayFrame::identify(&self.token, &self.config.properties);
        self.send(&identify);
    }

    fn send_heartbeat(&mut self) {
        if self.transport.is_none() {
            self.heartbeat_at = None;
            return;
        }
        self.send(&GatewayFrame::heartbeat(self.sequence));
        self.heartbeat_at = self.heartbeat_interval.map(|interval| Instant::now() + interval);
    }

    fn send(&self, frame: &GatewayFrame) {
        let Some(transport) = &self.transport else {
            debug!(op = frame.op, "no gateway socket; frame dropped");
            return;
        };
        match serde_json::to_string(frame) {
            Ok(json) => {
                let _ = transport.outgoing.send(Outbound::Text(json));
            }
            Err(e) => warn!(error = %e, "failed to serialize gateway frame"),
        }
    }

    // -- waiters & status --------------------------------------------------

    fn resolve_waiters(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }
    }

    fn fail_waiters(&mut self, error: GatewayError) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
    }

    fn publish_status(&self) {
        let status = SessionStatus {
            phase: self.phase,
            session_id: self.session_id.clone(),
            resume_url: self.resume_url.clone(),
            sequence: self.sequence,
            reconnect_pending: self.reconnect_at.is_some(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

async fn wait_connect(slot: &mut Option<ConnectFuture>) -> Result<Transport, GatewayError> {
    match slot {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_socket_event(slot: &mut Option<Transport>) -> SocketEvent {
    match slot {
        Some(transport) => transport
            .incoming
            .recv()
            .await
            .unwrap_or(SocketEvent::Closed { code: None }),
        None => pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
