//! Loopback WebSocket server: accept, classify by HELLO, then route.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use onair_common::ContextRole;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::hub::ContextHub;
use crate::protocol::{ContextHello, DaemonMessage};

type Socket = WebSocketStream<TcpStream>;

/// Accept connections forever.
pub async fn serve(listener: TcpListener, hub: Arc<ContextHub>, hello_timeout: Duration) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, hub, hello_timeout).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Handle a single context connection.
pub async fn handle_connection(
    ws: Socket,
    addr: SocketAddr,
    hub: Arc<ContextHub>,
    hello_timeout: Duration,
) {
    let (mut sink, mut stream) = ws.split();

    let Some(role) = read_hello(&mut stream, addr, hello_timeout).await else {
        let _ = send(
            &mut sink,
            &DaemonMessage::Error {
                message: "expected HELLO".into(),
            },
        )
        .await;
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = hub.register(role, tx).await;
    tracing::info!(peer = %addr, context = %id, ?role, "Context connected");

    if send(&mut sink, &DaemonMessage::Welcome { context_id: id.clone() })
        .await
        .is_err()
    {
        hub.unregister(&id).await;
        return;
    }

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = hub.handle_text(&id, role, text.as_str()).await {
                            if send(&mut sink, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, context = %id, ?role, "Context disconnected");
    hub.unregister(&id).await;
}

/// Read the first message as a [`ContextHello`].
async fn read_hello(
    stream: &mut SplitStream<Socket>,
    addr: SocketAddr,
    timeout: Duration,
) -> Option<ContextRole> {
    let frame = tokio::time::timeout(timeout, stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ContextHello>(text.as_str()) {
            Ok(ContextHello::Hello { role }) => Some(role),
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid hello message");
                None
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text hello");
            None
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during hello");
            None
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before hello");
            None
        }
        Err(_) => {
            tracing::warn!(peer = %addr, ?timeout, "Hello timeout");
            None
        }
    }
}

async fn send(
    sink: &mut SplitSink<Socket, Message>,
    message: &DaemonMessage,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    sink.send(Message::Text(message.to_json().into())).await
}
