//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_onair_config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        onair_common::ConfigError::FileNotFound(_)
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[presence]
application_id = "1234"
activity_name = "Night Radio"

[observer]
debounce_ms = 250
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.presence.application_id, "1234");
    assert_eq!(config.presence.activity_name, "Night Radio");
    assert_eq!(config.observer.debounce_ms, 250);
    // Defaults preserved
    assert_eq!(config.gateway.url, "wss://gateway.discord.gg");
    assert_eq!(config.gateway.disconnect_grace_ms, 20_000);
    assert!(config.presence.buttons.is_empty());
}

#[test]
fn load_buttons_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[presence]
buttons = [{ label = "Listen In", url = "https://www.nts.live" }]
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.presence.buttons.len(), 1);
    assert_eq!(config.presence.buttons[0].label, "Listen In");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, onair_common::ConfigError::ParseError(_)));
}

#[test]
fn out_of_range_values_still_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[gateway]
reconnect_delay_ms = 1
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.gateway.reconnect_delay_ms, 1);
}

#[test]
fn template_parses_to_defaults() {
    let config: crate::OnairConfig = toml::from_str(&template::default_config_toml()).unwrap();
    assert_eq!(config.observer.debounce_ms, 1_000);
    assert_eq!(config.daemon.port, 7783);
    assert!(config.presence.application_id.is_empty());
}

#[test]
fn create_default_config_writes_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    create_default_config(&path).unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.gateway.reconnect_delay_ms, 1_000);
}

#[test]
fn default_config_path_ends_with_onair() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("onair/config.toml"));
    }
}
