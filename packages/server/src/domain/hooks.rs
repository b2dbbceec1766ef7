//! Gameplay hooks invoked when the handshake completes.

use super::{ClientId, Mission, SpawnPoint};

#[cfg_attr(test, mockall::automock)]
pub trait GameHooks: Send + Sync {
    /// The client finished loading the mission; returns where it spawns.
    fn on_client_enter_game(&self, client_id: &ClientId, mission: &Mission) -> SpawnPoint;
}
