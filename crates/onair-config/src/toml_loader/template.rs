//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# onair configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[presence]
# enabled = true
# Application id issued by the presence service. Required for login.
application_id = ""
# image_asset_id = ""
# activity_name = "NTS Radio"
# buttons = [{ label = "Listen In", url = "https://www.nts.live" }]

[gateway]
# url = "wss://gateway.discord.gg"
# disconnect_grace_ms = 20000   # 1000-300000
# reconnect_delay_ms = 1000     # 100-60000
# connect_timeout_secs = 15     # 1-120

[observer]
# debounce_ms = 1000            # 50-10000

[auth]
# redirect_uri = "http://127.0.0.1:7783/callback"
# expiration_tolerance_secs = 3600   # 0-86400
# token_file = "/path/to/tokens.json"

[daemon]
# bind = "127.0.0.1"
# port = 7783
# hello_timeout_secs = 10       # 1-120

[logging]
# level = "INFO"                # TRACE, DEBUG, INFO, WARNING, ERROR
# ansi = true
"##
    .to_string()
}
