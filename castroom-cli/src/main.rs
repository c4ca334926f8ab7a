mod share;
mod watch;

use anyhow::{Context, Result};
use castroom::RoomCode;
use castroom::relay::RelayConfig;
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "castroom", version, about = "Screen sharing rooms over WebRTC")]
struct Cli {
    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(long, env = "CASTROOM_BIND", default_value = "0.0.0.0:3001")]
        bind: SocketAddr,
    },
    /// Join a room as its host and share a synthetic screen.
    Share {
        #[command(flatten)]
        session: SessionArgs,

        /// Seconds to wait before the screen becomes available.
        #[arg(long, default_value_t = 0)]
        media_delay_secs: u64,
    },
    /// Join a room as a viewer.
    Watch {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// WebSocket endpoint of the relay.
    #[arg(long, env = "CASTROOM_RELAY_URL", default_value = "ws://127.0.0.1:3001/ws")]
    url: String,

    #[arg(long)]
    room: String,

    /// Display name; prompted for when omitted.
    #[arg(long)]
    name: Option<String>,
}

impl SessionArgs {
    fn room(&self) -> RoomCode {
        RoomCode::new(&self.room)
    }

    fn display_name(&self) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        Input::<String>::new()
            .with_prompt("Display name")
            .interact_text()
            .context("Failed to read display name")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Relay { bind } => {
            println!("{} {}", "📡 Relay listening on".green().bold(), bind);
            castroom::relay::run(RelayConfig {
                bind,
                ..RelayConfig::default()
            })
            .await
        }
        Commands::Share {
            session,
            media_delay_secs,
        } => {
            let name = session.display_name()?;
            share::run(&session.url, session.room(), name, media_delay_secs).await
        }
        Commands::Watch { session } => {
            let name = session.display_name()?;
            watch::run(&session.url, session.room(), name).await
        }
    }
}
