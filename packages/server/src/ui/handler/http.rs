//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::http::{
        ConnectionDto, LoadMissionRequest, LoadMissionResponse, ServerInfoDto,
    },
    ui::state::AppState,
    usecase::MissionError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Slot usage and mission state
pub async fn get_server(State(state): State<Arc<AppState>>) -> Json<ServerInfoDto> {
    let params = state.server_params_usecase.execute().await;
    Json(params.into())
}

/// Connected clients with their handshake phase
pub async fn get_connections(State(state): State<Arc<AppState>>) -> Json<Vec<ConnectionDto>> {
    let connections = state.get_connections_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(connections.iter().map(ConnectionDto::from).collect())
}

/// Load a mission and restart every client's download
pub async fn load_mission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadMissionRequest>,
) -> Result<Json<LoadMissionResponse>, StatusCode> {
    match state
        .mission_download_usecase
        .load_mission(&request.name)
        .await
    {
        Ok(sequence) => Ok(Json(LoadMissionResponse {
            mission: request.name,
            sequence: sequence.value(),
        })),
        Err(MissionError::UnknownMission(name)) => {
            tracing::warn!("Requested unknown mission '{}'", name);
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            tracing::error!("Failed to load mission '{}': {}", request.name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
