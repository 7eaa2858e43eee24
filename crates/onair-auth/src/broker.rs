//! Token broker: the single owner of the user's credentials.

use std::time::Duration;

use onair_common::{AuthError, Event, ExtensionRequest, ExtensionResponse};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::client::{TokenEndpoint, TokenGrant};
use crate::launcher::{code_from_redirect, AuthorizationLauncher};
use crate::pkce::PkcePair;
use crate::storage::{StoredTokens, TokenStore};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Caches and persists tokens, refreshes them before they expire, and
/// announces every access-token change as [`Event::TokenUpdated`].
pub struct TokenBroker {
    store: TokenStore,
    endpoint: Box<dyn TokenEndpoint>,
    launcher: Box<dyn AuthorizationLauncher>,
    tokens: Mutex<StoredTokens>,
    launch: Mutex<()>,
    tolerance_ms: i64,
    events: broadcast::Sender<Event>,
}

impl TokenBroker {
    /// Create a broker seeded from durable storage.
    pub fn new(
        store: TokenStore,
        endpoint: Box<dyn TokenEndpoint>,
        launcher: Box<dyn AuthorizationLauncher>,
        tolerance: Duration,
        events: broadcast::Sender<Event>,
    ) -> Result<Self, AuthError> {
        let tokens = store.load()?;
        Ok(Self {
            store,
            endpoint,
            launcher,
            tokens: Mutex::new(tokens),
            launch: Mutex::new(()),
            tolerance_ms: i64::try_from(tolerance.as_millis()).unwrap_or(i64::MAX),
            events,
        })
    }

    /// The cached access token without any refresh attempt.
    pub async fn cached_token(&self) -> String {
        self.tokens.lock().await.access_token.clone()
    }

    /// Return a usable access token.
    ///
    /// A token close to expiry is refreshed first. With no token at all,
    /// an empty string is returned unless `allow_reauth` permits launching
    /// the interactive flow. The token cache stays unlocked while the user
    /// is in the interactive flow.
    pub async fn get_token(&self, allow_reauth: bool) -> Result<String, AuthError> {
        {
            let mut tokens = self.tokens.lock().await;
            if !tokens.access_token.is_empty() {
                if tokens.is_fresh(now_ms(), self.tolerance_ms) {
                    return Ok(tokens.access_token.clone());
                }

                info!("access token near expiry, refreshing");
                let grant = self.endpoint.refresh(&tokens.refresh_token).await?;
                self.apply_grant(&mut tokens, grant)?;
                return Ok(tokens.access_token.clone());
            }
        }

        if !allow_reauth {
            return Ok(String::new());
        }

        // One interactive flow at a time; a flow that finished while we
        // waited already produced a token.
        let _launch = self.launch.lock().await;
        let cached = self.cached_token().await;
        if !cached.is_empty() {
            return Ok(cached);
        }

        let pkce = PkcePair::generate();
        let url = self.endpoint.authorization_url(&pkce.challenge)?;
        info!("launching authorization");
        let redirect = self.launcher.launch(&url).await?;
        let code = code_from_redirect(&redirect)?;
        info!("authorization complete");

        let grant = self.endpoint.exchange_code(&code, &pkce.verifier).await?;
        let mut tokens = self.tokens.lock().await;
        self.apply_grant(&mut tokens, grant)?;
        Ok(tokens.access_token.clone())
    }

    /// Revoke the current access token and forget all credentials.
    pub async fn revoke(&self) -> Result<(), AuthError> {
        let mut tokens = self.tokens.lock().await;
        if tokens.access_token.is_empty() {
            return Ok(());
        }

        self.endpoint.revoke(&tokens.access_token).await?;
        self.replace(&mut tokens, StoredTokens::signed_out())
    }

    /// Re-read durable storage, announcing a change made by another process.
    pub async fn reload_from_store(&self) -> Result<(), AuthError> {
        let stored = self.store.load()?;
        let mut tokens = self.tokens.lock().await;
        if *tokens == stored {
            return Ok(());
        }
        if tokens.access_token != stored.access_token {
            info!("stored credentials changed outside the broker");
            self.announce(&stored.access_token);
        }
        *tokens = stored;
        Ok(())
    }

    /// Answer an inter-context request. Broadcasts get no response.
    pub async fn handle_request(&self, request: &ExtensionRequest) -> Option<ExtensionResponse> {
        let result = match request {
            ExtensionRequest::GetToken => self.get_token(false).await.map(token_response),
            ExtensionRequest::LaunchAuthorization => {
                self.get_token(true).await.map(token_response)
            }
            ExtensionRequest::RevokeTokens => {
                self.revoke().await.map(|()| ExtensionResponse::Ack(true))
            }
            ExtensionRequest::TokenUpdate { .. } => return None,
        };

        Some(result.unwrap_or_else(|e| {
            warn!(error = %e, "token request failed");
            ExtensionResponse::Error {
                error: e.to_string(),
            }
        }))
    }

    fn apply_grant(&self, tokens: &mut StoredTokens, grant: TokenGrant) -> Result<(), AuthError> {
        let refresh_token = if grant.refresh_token.is_empty() {
            tokens.refresh_token.clone()
        } else {
            grant.refresh_token
        };
        let next = StoredTokens {
            access_token: grant.access_token,
            refresh_token,
            expiration: now_ms() + grant.expires_in.saturating_mul(1000),
        };
        self.replace(tokens, next)
    }

    fn replace(&self, tokens: &mut StoredTokens, next: StoredTokens) -> Result<(), AuthError> {
        self.store.save(&next)?;
        let changed = tokens.access_token != next.access_token;
        *tokens = next;
        if changed {
            self.announce(&tokens.access_token);
        }
        Ok(())
    }

    fn announce(&self, access_token: &str) {
        let _ = self.events.send(Event::TokenUpdated {
            access_token: access_token.to_string(),
        });
    }
}

fn token_response(access_token: String) -> ExtensionResponse {
    ExtensionResponse::Token { access_token }
}
