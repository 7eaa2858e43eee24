//! Tracing subscriber setup.

use onair_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Crates whose spans and events the daemon shows by default.
const CRATES: [&str; 5] = [
    "onair",
    "onair_common",
    "onair_config",
    "onair_auth",
    "onair_presence",
];

/// Build the filter directive: a CLI override wins over the config level.
pub fn directive(cli_level: Option<&str>, config: &LoggingConfig) -> String {
    let level = cli_level.unwrap_or_else(|| config.level.as_directive());
    if level.contains('=') {
        return level.to_string();
    }
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` directives are kept and the
/// computed directive is added on top.
pub fn init(cli_level: Option<&str>, config: &LoggingConfig) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(""));
    for part in directive(cli_level, config).split(',') {
        match part.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("ignoring invalid log directive {part:?}: {e}"),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_config::LogLevel;

    #[test]
    fn config_level_applies_to_workspace_crates() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            ansi: false,
        };
        let directive = directive(None, &config);
        assert!(directive.contains("onair_presence=debug"));
        assert!(directive.contains("onair=debug"));
    }

    #[test]
    fn cli_level_overrides_config() {
        let directive = directive(Some("warn"), &LoggingConfig::default());
        assert!(directive.contains("onair_auth=warn"));
        assert!(!directive.contains("info"));
    }

    #[test]
    fn full_directives_pass_through() {
        let directive = directive(Some("onair_presence=trace"), &LoggingConfig::default());
        assert_eq!(directive, "onair_presence=trace");
    }
}
