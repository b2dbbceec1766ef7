//! Dependency wiring shared by the binary and the integration tests.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use missionlink_shared::time::Clock;

use crate::{
    config::{ConfigError, ServerConfig},
    infrastructure::{
        game_hooks::SpawnRotation, message_pusher::WebSocketMessagePusher,
        replication::PushGhostReplicator, repository::InMemoryLobbyRepository,
    },
    ui::state::AppState,
    usecase::{
        AdmitConnectionUseCase, DropConnectionUseCase, GetConnectionsUseCase,
        MissionDownloadUseCase, ServerParamsUseCase, SetReadyStatusUseCase,
        UpdateClientDataUseCase,
    },
};

/// Build every use case from the config.
///
/// Dependencies are created in order:
/// 1. Repository
/// 2. MessagePusher and replication
/// 3. UseCases
pub fn build_app_state(config: &ServerConfig, clock: Arc<dyn Clock>) -> Result<AppState, ConfigError> {
    // 1. Create Repository (in-memory lobby)
    let lobby = Arc::new(Mutex::new(config.lobby()?));
    let repository = Arc::new(InMemoryLobbyRepository::new(lobby));

    // 2. Create MessagePusher (WebSocket implementation) and the ghost replicator
    let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
        HashMap::new(),
    ))));
    let replicator = Arc::new(PushGhostReplicator::new(message_pusher.clone()));
    let hooks = Arc::new(SpawnRotation::new(config.spawn_points.clone()));

    // 3. Create UseCases
    Ok(AppState {
        admit_connection_usecase: Arc::new(AdmitConnectionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
        )),
        drop_connection_usecase: Arc::new(DropConnectionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        update_client_data_usecase: Arc::new(UpdateClientDataUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock,
        )),
        set_ready_status_usecase: Arc::new(SetReadyStatusUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        mission_download_usecase: Arc::new(MissionDownloadUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            replicator,
            hooks,
            Arc::new(config.catalog()),
        )),
        server_params_usecase: Arc::new(ServerParamsUseCase::new(
            repository.clone(),
            message_pusher,
        )),
        get_connections_usecase: Arc::new(GetConnectionsUseCase::new(repository)),
    })
}
