//! Game client for a missionlink server.
//!
//! Joins the server, follows the mission download handshake and reports
//! loading progress. Lost connections are retried (max 5 attempts with a 5
//! second interval); a rejection (server full, banned, bad invite) exits at
//! once.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin missionlink-client -- --name Alice
//! cargo run --bin missionlink-client -- -n Bob --invite secret --lighting-ms 500
//! cargo run --bin missionlink-client -- --info
//! ```

use std::time::Duration;

use clap::Parser;

use missionlink_client::{ConnectOptions, info::fetch_server_info, run_client};
use missionlink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "missionlink-client")]
#[command(about = "Game client that joins a missionlink server", long_about = None)]
struct Args {
    /// Player name shown to other players
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Stable player identity used for bans
    #[arg(short = 'i', long, default_value = "")]
    identity: String,

    /// Invite code for private slots
    #[arg(long)]
    invite: Option<String>,

    /// Announce a demo build
    #[arg(long)]
    demo: bool,

    /// Duration of the simulated lighting bake in milliseconds
    #[arg(long, default_value_t = 1500)]
    lighting_ms: u64,

    /// Print the server info and exit
    #[arg(long)]
    info: bool,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:28000/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "missionlink_client", "info");

    let args = Args::parse();

    if args.info {
        match fetch_server_info(&args.url).await {
            Ok(info) => {
                println!("Server: {}", info.host_name);
                println!(
                    "Mission: {} (seq {}, {})",
                    info.mission.as_deref().unwrap_or("(none)"),
                    info.sequence,
                    if info.mission_running {
                        "running"
                    } else {
                        "stopped"
                    }
                );
                println!(
                    "Public slots: {} used / {} free",
                    info.public_slots.used, info.public_slots.free
                );
                println!(
                    "Private slots: {} used / {} free",
                    info.private_slots.used, info.private_slots.free
                );
            }
            Err(e) => {
                tracing::error!("Failed to query server: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let options = ConnectOptions {
        url: args.url,
        name: args.name,
        identity: args.identity,
        invite: args.invite,
        demo: args.demo,
        lighting: Duration::from_millis(args.lighting_ms),
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
