//! Data Transfer Objects (DTOs) for the HTTP API.
//!
//! WebSocket frames use the shared `protocol` types directly.

pub mod http;
