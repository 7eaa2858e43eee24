//! OAuth2 token endpoint client.

use async_trait::async_trait;
use onair_common::AuthError;
use onair_config::AuthConfig;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

/// Tokens returned by a successful exchange or refresh.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// The token endpoint operations the broker needs.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Build the URL the user is sent to for consent.
    fn authorization_url(&self, code_challenge: &str) -> Result<String, AuthError>;

    async fn exchange_code(&self, code: &str, code_verifier: &str)
        -> Result<TokenGrant, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError>;

    async fn revoke(&self, access_token: &str) -> Result<(), AuthError>;
}

/// `reqwest`-backed client for the configured OAuth2 endpoints.
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    config: AuthConfig,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, config: AuthConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            client_id: client_id.into(),
            config,
        })
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, AuthError> {
        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::TokenEndpoint(format!("{status}: {body}")));
        }
        Ok(body)
    }

    async fn request_grant(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let body = self.post_form(&self.config.token_url, form).await?;
        serde_json::from_str(&body)
            .map_err(|e| AuthError::TokenEndpoint(format!("unexpected token response: {e}")))
    }
}

#[async_trait]
impl TokenEndpoint for OAuthClient {
    fn authorization_url(&self, code_challenge: &str) -> Result<String, AuthError> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
            ],
        )
        .map_err(|e| AuthError::AuthorizationFailed(format!("invalid authorize URL: {e}")))?;
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenGrant, AuthError> {
        debug!("exchanging authorization code for tokens");
        self.request_grant(&[
            ("client_id", self.client_id.as_str()),
            ("code_verifier", code_verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        debug!("refreshing access token");
        self.request_grant(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        debug!("revoking access token");
        self.post_form(
            &self.config.revoke_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("token", access_token),
                ("token_type_hint", "access_token"),
            ],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_carries_pkce_params() {
        let client = OAuthClient::new("1234", AuthConfig::default()).unwrap();
        let url = Url::parse(&client.authorization_url("chal").unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("discord.com"));
        assert_eq!(params["client_id"], "1234");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["code_challenge"], "chal");
        assert_eq!(params["scope"], "identify sdk.social_layer_presence");
    }

    #[test]
    fn grant_parses_token_response() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":604800,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "a");
        assert_eq!(grant.refresh_token, "r");
        assert_eq!(grant.expires_in, 604_800);
    }

    #[test]
    fn grant_debug_is_redacted() {
        let grant = TokenGrant {
            access_token: "secret".into(),
            refresh_token: "also-secret".into(),
            expires_in: 10,
        };
        let debug = format!("{grant:?}");
        assert!(!debug.contains("secret"));
    }
}
