//! Entities of the lobby aggregate.

use serde::{Deserialize, Serialize};

use missionlink_shared::protocol::{ClientJoinData, MissionSequence};

use super::{
    phase::MissionPhase,
    slot_pool::SlotKind,
    value_object::{ClientId, Identity, PlayerName, Timestamp},
};

/// One connected player.
///
/// Created when a connect request is admitted, removed when the connection
/// drops. `slot` is set exactly once, the first time client data is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConnection {
    pub id: ClientId,
    pub address: String,
    pub name: PlayerName,
    pub identity: Identity,
    pub invited: bool,
    pub is_host: bool,
    pub data_initialized: bool,
    pub slot: Option<SlotKind>,
    pub join_time: Timestamp,
    pub join_in_progress: bool,
    pub score: i32,
    pub ready: bool,
    pub phase: MissionPhase,
}

impl ClientConnection {
    pub fn new(id: ClientId, address: String, name: PlayerName, joined_at: Timestamp) -> Self {
        Self {
            id,
            address,
            name,
            identity: Identity::default(),
            invited: false,
            is_host: false,
            data_initialized: false,
            slot: None,
            join_time: joined_at,
            join_in_progress: false,
            score: 0,
            ready: false,
            phase: MissionPhase::Idle,
        }
    }

    pub fn using_private_slot(&self) -> bool {
        self.slot == Some(SlotKind::Private)
    }

    pub fn to_join_data(&self) -> ClientJoinData {
        ClientJoinData {
            client_id: self.id.as_str().to_string(),
            name: self.name.as_str().to_string(),
            identity: self.identity.as_str().to_string(),
            is_host: self.is_host,
            invited: self.invited,
            ready: self.ready,
            score: self.score,
            join_time: self.join_time.value(),
            join_in_progress: self.join_in_progress,
        }
    }
}

/// Client-supplied data applied on join and on later refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    pub name: PlayerName,
    pub identity: Identity,
    pub invited: bool,
    pub local: bool,
}

/// Result of applying client data.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpdate {
    pub connection: ClientConnection,
    /// `true` the first time data was applied to this connection.
    pub new_client: bool,
}

/// Spawn position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint(pub [f32; 3]);

impl SpawnPoint {
    /// Used when a mission defines no spawn points.
    pub const FALLBACK: SpawnPoint = SpawnPoint([0.0, 0.0, 300.0]);
}

/// A loadable mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub name: String,
    /// Path data pushed before ghosting.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Objects every client receives during the ghost-always transfer.
    #[serde(default)]
    pub ghost_objects: Vec<String>,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
}

impl Mission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paths: Vec::new(),
            ghost_objects: Vec::new(),
            spawn_points: Vec::new(),
        }
    }
}

/// Server side mission-load state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MissionState {
    pub sequence: MissionSequence,
    pub running: bool,
    pub mission: Option<Mission>,
}

impl MissionState {
    pub fn mission_name(&self) -> Option<&str> {
        self.mission.as_ref().map(|m| m.name.as_str())
    }
}

/// Missions the server can load, looked up by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionCatalog {
    missions: Vec<Mission>,
}

impl MissionCatalog {
    pub fn new(missions: Vec<Mission>) -> Self {
        Self { missions }
    }

    pub fn find(&self, name: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.missions.iter().map(|m| m.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }
}
