//! Game server with the mission download handshake.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin missionlink-server
//! cargo run --bin missionlink-server -- --host 0.0.0.0 --port 28000 --config server.toml
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use missionlink_server::{config::ServerConfig, ui::Server, wiring::build_app_state};
use missionlink_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "missionlink-server")]
#[command(about = "Game server with connection admission and mission download", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "28000")]
    port: u16,

    /// Server preferences (TOML); defaults are used when omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "missionlink_server", "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => ServerConfig::load_from_file(path).await?,
        None => ServerConfig::default(),
    };
    tracing::info!(
        "{}: {} players ({} private)",
        config.server_name,
        config.max_players,
        config.private_slots
    );

    let state = build_app_state(&config, Arc::new(SystemClock))?;
    if let Some(mission) = &config.mission {
        state.mission_download_usecase.load_mission(mission).await?;
    }

    Server::new(state).run(args.host, args.port).await
}
