use clap::{Parser, Subcommand};

/// onair: mirror what the radio player is playing into your presence.
#[derive(Parser, Debug)]
#[command(name = "onair", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the daemon (default).
    Run,
    /// Link an account through the browser consent flow.
    Login,
    /// Revoke and forget stored credentials.
    Logout,
    /// Show whether credentials are stored and when they expire.
    Token,
    /// Print the effective configuration as TOML.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}
