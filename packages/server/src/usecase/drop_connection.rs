//! UseCase: 切断処理
//!
//! 接続を Lobby から削除してスロットを解放し、残りのクライアントに
//! `ClientDropped` と最新の `ServerParams` を通知します。

use std::sync::Arc;

use missionlink_shared::protocol::ServerCommand;

use crate::domain::{ClientConnection, ClientId, LobbyRepository, MessagePusher};

use super::{error::DropError, server_params::broadcast_server_params};

/// 切断のユースケース
pub struct DropConnectionUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DropConnectionUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// 通知の失敗は切断処理自体を失敗させない（ログのみ）。
    pub async fn execute(&self, client_id: &ClientId) -> Result<ClientConnection, DropError> {
        self.message_pusher.unregister_client(client_id).await;

        let connection = self
            .repository
            .remove_connection(client_id)
            .await
            .map_err(|_| DropError::NotConnected(client_id.as_str().to_string()))?;

        let remaining = self.repository.get_all_client_ids().await;
        let dropped = ServerCommand::ClientDropped {
            client_id: connection.id.as_str().to_string(),
            name: connection.name.as_str().to_string(),
        };
        if let Err(e) = self.message_pusher.broadcast(remaining, &dropped).await {
            tracing::warn!("Failed to broadcast drop of '{}': {}", client_id, e);
        }
        if let Err(e) =
            broadcast_server_params(self.repository.as_ref(), self.message_pusher.as_ref()).await
        {
            tracing::warn!("Failed to broadcast server params: {}", e);
        }

        tracing::info!(
            "Client '{}' ({}) dropped, {} slot released",
            connection.name,
            connection.id,
            connection.slot.map(|s| s.as_str()).unwrap_or("no")
        );
        Ok(connection)
    }
}
