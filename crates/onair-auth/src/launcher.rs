//! Interactive part of the authorization flow.

use async_trait::async_trait;
use onair_common::AuthError;
use reqwest::Url;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Sends the user to the consent page and returns the redirect URL the
/// provider sent them back to.
#[async_trait]
pub trait AuthorizationLauncher: Send + Sync {
    async fn launch(&self, authorization_url: &str) -> Result<String, AuthError>;
}

/// Prints the consent URL and reads the redirect URL back from stdin.
pub struct StdinLauncher;

#[async_trait]
impl AuthorizationLauncher for StdinLauncher {
    async fn launch(&self, authorization_url: &str) -> Result<String, AuthError> {
        eprintln!("Open this URL in your browser to link your account:\n\n  {authorization_url}\n");
        eprintln!("Then paste the full URL you were redirected to:");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::AuthorizationFailed(format!("failed to read stdin: {e}")))?;

        let line = line.trim();
        if line.is_empty() {
            return Err(AuthError::AuthorizationFailed("no redirect URL given".into()));
        }
        Ok(line.to_string())
    }
}

/// Extract the authorization code from a redirect URL.
pub fn code_from_redirect(redirect: &str) -> Result<String, AuthError> {
    let url = Url::parse(redirect)
        .map_err(|e| AuthError::AuthorizationFailed(format!("invalid redirect URL: {e}")))?;

    let mut code = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let description = description.unwrap_or_else(|| "no description".into());
        return Err(AuthError::AuthorizationFailed(format!(
            "{error}: {description}"
        )));
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::AuthorizationFailed("didn't receive access code".into()))
}
