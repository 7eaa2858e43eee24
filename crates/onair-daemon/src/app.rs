//! Daemon wiring: broker, observer, publisher, hub and server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use onair_auth::{OAuthClient, StdinLauncher, TokenBroker, TokenStore};
use onair_common::{Event, EventBus, OnairError};
use onair_config::{AuthConfig, OnairConfig};
use onair_presence::{
    ActivityTemplate, PlaybackStateObserver, PresencePublisher, SessionConfig,
    TungsteniteConnector,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::hub::ContextHub;
use crate::server;

const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Token storage at `auth.token_file`, else next to the config file.
pub fn token_store(config: &AuthConfig) -> Result<TokenStore, OnairError> {
    let path = match &config.token_file {
        Some(path) => PathBuf::from(path),
        None => onair_config::config_dir()?.join("tokens.json"),
    };
    Ok(TokenStore::new(path))
}

pub fn build_broker(config: &OnairConfig, bus: &EventBus) -> Result<Arc<TokenBroker>, OnairError> {
    let client = OAuthClient::new(config.presence.application_id.clone(), config.auth.clone())?;
    let broker = TokenBroker::new(
        token_store(&config.auth)?,
        Box::new(client),
        Box::new(StdinLauncher),
        Duration::from_secs(config.auth.expiration_tolerance_secs),
        bus.sender(),
    )?;
    Ok(Arc::new(broker))
}

/// Run the daemon until Ctrl-C.
pub async fn run(config: OnairConfig) -> Result<(), OnairError> {
    let bus = EventBus::new(64);
    let broker = build_broker(&config, &bus)?;

    let token = broker.get_token(false).await.unwrap_or_else(|e| {
        warn!(error = %e, "could not obtain an access token; starting signed out");
        String::new()
    });
    if token.is_empty() {
        info!("no linked account; run `onair login` to publish presence");
    }

    let (signal_tx, signal_rx) = mpsc::channel(256);
    let hub = Arc::new(ContextHub::new(Arc::clone(&broker), signal_tx));

    let publisher = if config.presence.enabled {
        let (obs_tx, obs_rx) = mpsc::channel(16);
        PlaybackStateObserver::from_config(&config.observer).spawn(signal_rx, obs_tx);
        let publisher = PresencePublisher::new(
            token,
            ActivityTemplate::from_config(&config.presence),
            SessionConfig::from_config(&config.gateway),
            Arc::new(TungsteniteConnector),
        );
        Some(tokio::spawn(publisher.run(obs_rx, bus.subscribe())))
    } else {
        info!("presence publishing disabled in config");
        None
    };

    let fan_out = tokio::spawn(Arc::clone(&hub).forward_token_updates(bus.subscribe()));
    let refresher = tokio::spawn(refresh_loop(Arc::clone(&broker)));

    let listener = TcpListener::bind((config.daemon.bind.as_str(), config.daemon.port)).await?;
    info!(addr = %listener.local_addr()?, "onair daemon listening");

    let hello_timeout = Duration::from_secs(config.daemon.hello_timeout_secs);
    tokio::select! {
        () = server::serve(listener, Arc::clone(&hub), hello_timeout) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutting down");
        }
    }

    bus.publish(Event::Shutdown);
    refresher.abort();
    if let Some(publisher) = publisher {
        join_task("publisher", publisher).await;
    }
    join_task("token fan-out", fan_out).await;
    info!("shutdown complete");
    Ok(())
}

/// Await a background task, logging a panic or cancellation. Returns
/// whether it ran to completion.
async fn join_task(name: &str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(task = name, error = %e, "background task failed");
            false
        }
    }
}

/// Pick up credentials written by another process and refresh before
/// expiry. The broker announces any change on the bus.
async fn refresh_loop(broker: Arc<TokenBroker>) {
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = broker.reload_from_store().await {
            warn!(error = %e, "failed to reload stored credentials");
        }
        match broker.get_token(false).await {
            Ok(token) => debug!(signed_in = !token.is_empty(), "credential check"),
            Err(e) => warn!(error = %e, "token refresh failed"),
        }
    }
}
