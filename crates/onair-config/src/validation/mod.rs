//! Full configuration validation.
//!
//! Each section validator pushes human-readable errors; the orchestrator
//! collects them into a single `ConfigError`.

mod helpers;


use crate::schema::OnairConfig;
use helpers::{validate_range, validate_url};
use onair_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &OnairConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_gateway(&mut errors, config);
    validate_presence(&mut errors, config);
    validate_observer(&mut errors, config);
    validate_auth(&mut errors, config);
    validate_daemon(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_gateway(errors: &mut Vec<String>, config: &OnairConfig) {
    let gateway = &config.gateway;
    validate_url(errors, "gateway.url", &gateway.url, &["wss", "ws"]);
    validate_range(
        errors,
        "gateway.disconnect_grace_ms",
        gateway.disconnect_grace_ms,
        1_000,
        300_000,
    );
    validate_range(
        errors,
        "gateway.reconnect_delay_ms",
        gateway.reconnect_delay_ms,
        100,
        60_000,
    );
    validate_range(
        errors,
        "gateway.connect_timeout_secs",
        gateway.connect_timeout_secs,
        1,
        120,
    );
}

fn validate_presence(errors: &mut Vec<String>, config: &OnairConfig) {
    let presence = &config.presence;
    if presence.activity_name.trim().is_empty() {
        errors.push("presence.activity_name must not be empty".into());
    }
    if presence.buttons.len() > 2 {
        errors.push(format!(
            "presence.buttons has {} entries, at most 2 are shown",
            presence.buttons.len()
        ));
    }
    for (i, button) in presence.buttons.iter().enumerate() {
        if button.label.trim().is_empty() {
            errors.push(format!("presence.buttons[{i}].label must not be empty"));
        }
        validate_url(
            errors,
            &format!("presence.buttons[{i}].url"),
            &button.url,
            &["https", "http"],
        );
    }
}

fn validate_observer(errors: &mut Vec<String>, config: &OnairConfig) {
    validate_range(
        errors,
        "observer.debounce_ms",
        config.observer.debounce_ms,
        50,
        10_000,
    );
}

fn validate_auth(errors: &mut Vec<String>, config: &OnairConfig) {
    let auth = &config.auth;
    validate_url(errors, "auth.authorize_url", &auth.authorize_url, &["https", "http"]);
    validate_url(errors, "auth.token_url", &auth.token_url, &["https", "http"]);
    validate_url(errors, "auth.revoke_url", &auth.revoke_url, &["https", "http"]);
    validate_range(
        errors,
        "auth.expiration_tolerance_secs",
        auth.expiration_tolerance_secs,
        0,
        86_400,
    );
    if auth.scopes.is_empty() {
        errors.push("auth.scopes must not be empty".into());
    }
}

fn validate_daemon(errors: &mut Vec<String>, config: &OnairConfig) {
    let daemon = &config.daemon;
    if daemon.port == 0 {
        errors.push("daemon.port must not be 0".into());
    }
    validate_range(
        errors,
        "daemon.hello_timeout_secs",
        daemon.hello_timeout_secs,
        1,
        120,
    );
}
