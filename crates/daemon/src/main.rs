//! sheetd - session-gated web API for editing character sheet documents.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sheetd_daemon::cli::{run_user_op, UserOp};
use sheetd_daemon::settings::Settings;
use sheetd_daemon::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the API server (the default)
    Serve {
        /// Listen address override, e.g. 0.0.0.0:8422
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Manage user accounts in the settings file
    User {
        #[command(subcommand)]
        op: UserOp,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = args.settings.unwrap_or_else(Settings::default_path);

    let listen_addr = match args.command {
        Some(Command::User { op }) => return run_user_op(&settings_path, op),
        Some(Command::Serve { listen }) => listen,
        None => None,
    };

    let config = Config {
        settings_path,
        listen_addr,
        log_level: args.log_level.parse().unwrap_or(tracing::Level::INFO),
    };
    sheetd_daemon::spawn_service(&config).await;
    Ok(())
}
