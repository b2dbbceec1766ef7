//! Request handlers.

mod http;
mod websocket;

pub use http::{get_connections, get_server, health_check, load_mission};
pub use websocket::websocket_handler;
