//! WebSocket connection handlers.
//!
//! Connect parameters travel in the query string
//! (`/ws?name=..&identity=..&invite=..&demo=..&local=..`). Malformed
//! parameters fail the upgrade with 400. Admission runs once the socket is
//! open; a refused client gets one `ConnectRejected` frame and a close.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use missionlink_shared::protocol::{ClientCommand, RejectReason, ServerCommand};

use crate::{
    domain::{AckOutcome, ClientId, ConnectRequest, Identity, PlayerName},
    ui::state::AppState,
    usecase::{ConnectError, MissionError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub name: String,
    #[serde(default)]
    pub identity: String,
    pub invite: Option<String>,
    #[serde(default)]
    pub demo: bool,
    /// Only honoured for loopback connections
    #[serde(default)]
    pub local: bool,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let name = PlayerName::new(query.name).map_err(|e| {
        tracing::warn!("Invalid player name from {}: {}", addr, e);
        StatusCode::BAD_REQUEST
    })?;
    let identity = Identity::new(query.identity).map_err(|e| {
        tracing::warn!("Invalid identity from {}: {}", addr, e);
        StatusCode::BAD_REQUEST
    })?;
    let request = ConnectRequest {
        address: addr.to_string(),
        name,
        identity,
        invite: query.invite.filter(|invite| !invite.is_empty()),
        demo: query.demo,
        local: query.local && addr.ip().is_loopback(),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, request)))
}

async fn send_rejection(mut socket: WebSocket, reason: RejectReason) {
    let frame = match (ServerCommand::ConnectRejected { reason }).to_json() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode rejection: {}", e);
            return;
        }
    };
    if let Err(e) = socket.send(Message::Text(frame.into())).await {
        tracing::debug!("Failed to deliver rejection: {}", e);
        return;
    }
    let _ = socket.send(Message::Close(None)).await;
}

/// Spawns a task that forwards encoded commands from the rx channel to the WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, request: ConnectRequest) {
    let address = request.address.clone();

    // Create a channel for this client to receive commands
    let (tx, rx) = mpsc::unbounded_channel();

    let connection = match state.admit_connection_usecase.execute(request, tx).await {
        Ok(connection) => connection,
        Err(ConnectError::Rejected(reason)) => {
            tracing::debug!("Sending rejection {} to {}", reason.code(), address);
            send_rejection(socket, reason).await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let client_id = connection.id.clone();

    let mut send_task = pusher_loop(rx, sender);

    if let Err(e) = state
        .admit_connection_usecase
        .announce_join(&connection)
        .await
    {
        tracing::warn!("Failed to announce join of '{}': {}", client_id, e);
    }
    // Join in progress: start the download of the running mission
    if let Err(e) = state.mission_download_usecase.start_client(&client_id).await {
        tracing::warn!("Failed to start mission download for '{}': {}", client_id, e);
    }

    let state_clone = state.clone();
    let client_id_clone = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error from '{}': {}", client_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match ClientCommand::from_json(&text) {
                    Ok(command) => dispatch(&state_clone, &client_id_clone, command).await,
                    Err(e) => {
                        tracing::warn!("Malformed frame from '{}': {}", client_id_clone, e);
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", client_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if let Err(e) = state.drop_connection_usecase.execute(&client_id).await {
        tracing::warn!("Failed to drop '{}': {}", client_id, e);
    }
}

/// Route one inbound command to its use case.
async fn dispatch(state: &AppState, client_id: &ClientId, command: ClientCommand) {
    tracing::trace!("Command from '{}': {:?}", client_id, command);
    let mission = &state.mission_download_usecase;
    let outcome: Result<AckOutcome, MissionError> = match command {
        ClientCommand::MissionStartPhase1Ack { sequence } => {
            mission.on_phase1_ack(client_id, sequence).await
        }
        ClientCommand::MissionStartPhase2Ack { sequence } => {
            mission.on_phase2_ack(client_id, sequence).await
        }
        ClientCommand::GhostAlwaysObjectsReceived { sequence } => {
            mission
                .on_ghost_always_objects_received(client_id, sequence)
                .await
        }
        ClientCommand::GhostAlwaysRetry { sequence } => {
            mission.on_ghost_always_retry(client_id, sequence).await
        }
        ClientCommand::MissionStartPhase3Ack { sequence } => {
            mission.on_phase3_ack(client_id, sequence).await
        }
        ClientCommand::SetReadyStatus { ready } => {
            if let Err(e) = state
                .set_ready_status_usecase
                .execute(client_id, ready)
                .await
            {
                tracing::warn!("Failed to broadcast ready status of '{}': {}", client_id, e);
            }
            return;
        }
        ClientCommand::UpdateClientData { name, identity } => {
            if let Err(e) = state
                .update_client_data_usecase
                .execute(client_id, name, identity)
                .await
            {
                tracing::warn!("Rejected client data from '{}': {}", client_id, e);
            }
            return;
        }
    };

    if let Err(e) = outcome {
        tracing::warn!("Mission handshake step failed for '{}': {}", client_id, e);
    }
}
