//! Test doubles for the token side of the daemon.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use onair_auth::{AuthorizationLauncher, StoredTokens, TokenBroker, TokenEndpoint, TokenGrant, TokenStore};
use onair_common::{AuthError, EventBus};

pub(crate) struct FakeEndpoint;

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    fn authorization_url(&self, code_challenge: &str) -> Result<String, AuthError> {
        Ok(format!("https://auth.test/authorize?code_challenge={code_challenge}"))
    }

    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> Result<TokenGrant, AuthError> {
        Ok(TokenGrant {
            access_token: format!("access-for-{code}"),
            refresh_token: "refresh".into(),
            expires_in: 604_800,
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, AuthError> {
        Err(AuthError::TokenEndpoint("refresh not expected".into()))
    }

    async fn revoke(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

pub(crate) struct FakeLauncher;

#[async_trait]
impl AuthorizationLauncher for FakeLauncher {
    async fn launch(&self, _authorization_url: &str) -> Result<String, AuthError> {
        Ok("http://127.0.0.1/callback?code=linked".into())
    }
}

pub(crate) fn fresh_tokens(access_token: &str) -> StoredTokens {
    StoredTokens {
        access_token: access_token.into(),
        refresh_token: "refresh".into(),
        expiration: chrono::Utc::now().timestamp_millis() + 7 * 24 * 3_600_000,
    }
}

/// A broker over `dir/tokens.json`, seeded with `access_token` unless it
/// is empty.
pub(crate) fn broker(dir: &Path, access_token: &str, bus: &EventBus) -> Arc<TokenBroker> {
    let store = TokenStore::new(dir.join("tokens.json"));
    if !access_token.is_empty() {
        store.save(&fresh_tokens(access_token)).unwrap();
    }
    Arc::new(
        TokenBroker::new(
            store,
            Box::new(FakeEndpoint),
            Box::new(FakeLauncher),
            Duration::from_secs(3600),
            bus.sender(),
        )
        .unwrap(),
    )
}
