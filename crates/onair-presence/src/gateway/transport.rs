//! Socket seam between the session task and the network.
//!
//! A [`Transport`] is a pair of channels. Dropping it tears the socket down
//! without a close handshake; [`Outbound::Close`] closes it cleanly.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::types::GatewayError;

/// Frames going to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Close with the given code and stop.
    Close(u16),
}

/// What the gateway sent us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Message(String),
    /// The socket is gone; `code` is the close code when one was received.
    Closed { code: Option<u16> },
}

pub struct Transport {
    pub outgoing: mpsc::UnboundedSender<Outbound>,
    pub incoming: mpsc::UnboundedReceiver<SocketEvent>,
}

impl Transport {
    /// Build a transport and hand back the far ends of its channels.
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<Outbound>,
        mpsc::UnboundedSender<SocketEvent>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Self {
                outgoing: out_tx,
                incoming: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

/// Opens sockets to a gateway URL.
#[async_trait]
pub trait GatewayConnector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Transport, GatewayError>;
}

// ---------------------------------------------------------------------------
// tokio-tungstenite implementation
// ---------------------------------------------------------------------------

pub struct TungsteniteConnector;

#[async_trait]
impl GatewayConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Transport, GatewayError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| GatewayError::Connect(e.to_string()))?;

        let (transport, out_rx, in_tx) = Transport::pair();
        tokio::spawn(pump(ws_stream, out_rx, in_tx));
        Ok(transport)
    }
}

/// Shuttle frames between the socket and the transport channels until
/// either side goes away.
async fn pump(
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut out_rx: mpsc::UnboundedReceiver<Outbound>,
    in_tx: mpsc::UnboundedSender<SocketEvent>,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                        warn!(error = %e, "gateway write failed");
                        let _ = in_tx.send(SocketEvent::Closed { code: None });
                        break;
                    }
                }
                Some(Outbound::Close(code)) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: String::new().into(),
                    };
                    let _ = ws_write.send(WsMessage::Close(Some(frame))).await;
                    break;
                }
                // Session dropped the transport.
                None => break,
            },
            incoming = ws_read.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    if in_tx.send(SocketEvent::Message(text.to_string())).is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code));
                    debug!(?code, "gateway closed the socket");
                    let _ = in_tx.send(SocketEvent::Closed { code });
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "gateway socket error");
                    let _ = in_tx.send(SocketEvent::Closed { code: None });
                    break;
                }
                None => {
                    let _ = in_tx.send(SocketEvent::Closed { code: None });
                    break;
                }
            },
        }
    }
}
