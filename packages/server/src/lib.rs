//! Game server: connection admission, slot accounting and the three-phase
//! mission download handshake, served over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod wiring;
