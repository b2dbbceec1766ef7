//! Infrastructure layer: concrete implementations of the domain traits.

pub mod dto;
pub mod game_hooks;
pub mod message_pusher;
pub mod replication;
pub mod repository;
