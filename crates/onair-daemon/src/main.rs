//! onair: local companion daemon that mirrors the radio player's "now
//! playing" state into the user's presence.

mod app;
mod cli;
mod commands;
mod hub;
mod logging;
mod protocol;
mod server;
#[cfg(test)]
mod testing;

use std::path::Path;

use cli::Command;
use onair_config::OnairConfig;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let loaded = onair_config::load_config(args.config.as_deref().map(Path::new));
    let fallback = OnairConfig::default();
    let logging_config = loaded.as_ref().map_or(&fallback.logging, |c| &c.logging);
    logging::init(args.log_level.as_deref(), logging_config);

    tracing::info!("onair v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {path}");
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        fallback.clone()
    });

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => app::run(config).await,
        Command::Login => commands::login(&config).await,
        Command::Logout => commands::logout(&config).await,
        Command::Token => commands::token(&config),
        Command::Config => {
            commands::print_config(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
