//! One-shot CLI subcommands.

use onair_auth::StoredTokens;
use onair_common::{EventBus, OnairError};
use onair_config::OnairConfig;

use crate::app::{build_broker, token_store};

pub async fn login(config: &OnairConfig) -> Result<(), OnairError> {
    let bus = EventBus::new(8);
    let broker = build_broker(config, &bus)?;
    let token = broker.get_token(true).await?;
    if token.is_empty() {
        return Err(OnairError::Other("authorization returned no token".into()));
    }
    println!("Account linked.");
    Ok(())
}

pub async fn logout(config: &OnairConfig) -> Result<(), OnairError> {
    let bus = EventBus::new(8);
    let broker = build_broker(config, &bus)?;
    broker.revoke().await?;
    println!("Signed out.");
    Ok(())
}

pub fn token(config: &OnairConfig) -> Result<(), OnairError> {
    let tokens = token_store(&config.auth)?.load()?;
    println!("{}", describe(&tokens, chrono::Utc::now().timestamp_millis()));
    Ok(())
}

pub fn print_config(config: &OnairConfig) {
    print!("{}", onair_config::config_to_toml(config));
}

/// Human-readable credential status. Never includes the tokens.
fn describe(tokens: &StoredTokens, now_ms: i64) -> String {
    if tokens.access_token.is_empty() {
        return "signed out".into();
    }
    match chrono::DateTime::from_timestamp_millis(tokens.expiration) {
        Some(at) if tokens.expiration > now_ms => {
            format!("signed in; access token expires {}", at.to_rfc3339())
        }
        Some(at) => format!("signed in; access token expired {}", at.to_rfc3339()),
        None => "signed in; expiry unknown".into(),
    }
}
