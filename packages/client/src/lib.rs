//! CLI game client: joins a server, mirrors the mission download handshake
//! and bakes scene lighting before acknowledging the last phase.

mod domain;
mod error;
mod formatter;
pub mod info;
pub mod lighting;
pub mod mission;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::run_client;
pub use session::ConnectOptions;
