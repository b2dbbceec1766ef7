//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use missionlink_shared::{protocol::ServerParams, time::timestamp_to_rfc3339};

use crate::domain::ClientConnection;

/// `GET /api/server`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfoDto {
    pub host_name: String,
    pub mission: Option<String>,
    pub sequence: u32,
    pub mission_running: bool,
    pub public_slots: SlotUsageDto,
    pub private_slots: SlotUsageDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUsageDto {
    pub used: u32,
    pub free: u32,
}

/// One entry of `GET /api/connections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub client_id: String,
    pub name: String,
    pub is_host: bool,
    pub invited: bool,
    pub ready: bool,
    /// Slot kind (`public` / `private`), `None` before client data was applied
    pub slot: Option<String>,
    pub phase: String,
    pub phase_value: f32,
    pub join_time: String,
    pub join_in_progress: bool,
}

/// `POST /api/mission` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadMissionRequest {
    pub name: String,
}

/// `POST /api/mission` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadMissionResponse {
    pub mission: String,
    pub sequence: u32,
}

impl From<ServerParams> for ServerInfoDto {
    fn from(params: ServerParams) -> Self {
        Self {
            host_name: params.host_name,
            mission: params.mission_name,
            sequence: params.sequence.value(),
            mission_running: params.mission_running,
            public_slots: SlotUsageDto {
                used: params.public_slots_used,
                free: params.public_slots_free,
            },
            private_slots: SlotUsageDto {
                used: params.private_slots_used,
                free: params.private_slots_free,
            },
        }
    }
}

impl From<&ClientConnection> for ConnectionDto {
    fn from(connection: &ClientConnection) -> Self {
        Self {
            client_id: connection.id.as_str().to_string(),
            name: connection.name.as_str().to_string(),
            is_host: connection.is_host,
            invited: connection.invited,
            ready: connection.ready,
            slot: connection.slot.map(|s| s.as_str().to_string()),
            phase: format!("{:?}", connection.phase),
            phase_value: connection.phase.legacy_value(),
            join_time: timestamp_to_rfc3339(connection.join_time.value()),
            join_in_progress: connection.join_in_progress,
        }
    }
}
