//! UI layer: axum routes for the WebSocket game channel and the HTTP API.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
