// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Satchel - session sync for the school app backend.
//!
//! This is the binary entry point. Every command loads configuration, opens
//! the session database, and restores the persisted session before acting.

mod app;
mod commands;
mod prompt;
mod shutdown;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use satchel_config::model::SatchelConfig;

/// Satchel - session sync for the school app backend.
#[derive(Parser, Debug)]
#[command(name = "satchel", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with a backend token.
    Login {
        /// Token to use. Falls back to SATCHEL_TOKEN, then an interactive prompt.
        #[arg(long)]
        token: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the stored session and payment status.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Refresh the session from the backend once.
    Refresh,
    /// Keep the session fresh until interrupted.
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            satchel_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Commands::Login { token } => commands::run_login(&config, token).await,
        Commands::Logout => commands::run_logout(&config).await,
        Commands::Status { json } => commands::run_status(&config, json).await,
        Commands::Refresh => commands::run_refresh(&config).await,
        Commands::Watch => watch::run_watch(&config).await,
    };

    if let Err(e) = result {
        eprintln!("satchel: {e}");
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<SatchelConfig, Vec<satchel_config::ConfigError>> {
    match path {
        Some(path) => satchel_config::load_and_validate_path(path),
        None => satchel_config::load_and_validate(),
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("satchel={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn login_accepts_token_flag() {
        let cli = Cli::try_parse_from(["satchel", "login", "--token", "abc"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { token: Some(ref t) } if t == "abc"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["satchel", "status", "--json", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("x.toml")));
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            satchel_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.api.auth_scheme, "Token");
    }
}
