//! Default gameplay hooks.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{ClientId, GameHooks, Mission, SpawnPoint};

/// Hands out spawn points round robin.
///
/// A mission's own spawn points win over the server-wide list.
pub struct SpawnRotation {
    default_spawns: Vec<SpawnPoint>,
    next: AtomicUsize,
}

impl SpawnRotation {
    pub fn new(default_spawns: Vec<SpawnPoint>) -> Self {
        Self {
            default_spawns,
            next: AtomicUsize::new(0),
        }
    }
}

impl GameHooks for SpawnRotation {
    fn on_client_enter_game(&self, client_id: &ClientId, mission: &Mission) -> SpawnPoint {
        let spawns = if mission.spawn_points.is_empty() {
            &self.default_spawns
        } else {
            &mission.spawn_points
        };
        if spawns.is_empty() {
            tracing::error!(
                "No spawn points for mission '{}', spawning '{}' at the fallback position",
                mission.name,
                client_id
            );
            return SpawnPoint::FALLBACK;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % spawns.len();
        spawns[index]
    }
}
